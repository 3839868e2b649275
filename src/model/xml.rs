//! Attribute parsing for the XML definition files.
//!
//! Missing attributes fall back to the caller's default; an attribute that
//! is present but malformed is an error.

use glam::{IVec2, Vec2, Vec3};
use roxmltree::Node;

use crate::error::DefinitionError;
use crate::model::geometry::{EulerAngles, Rgba8};

/// A value that can be read from the text of one attribute
pub trait FromAttribute: Sized {
    fn from_attribute(text: &str) -> Option<Self>;
}

fn parse_floats<const N: usize>(text: &str) -> Option<[f32; N]> {
    let mut out = [0.0; N];
    let mut parts = text.split(',');
    for slot in out.iter_mut() {
        *slot = parts.next()?.trim().parse().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(out)
}

impl FromAttribute for f32 {
    fn from_attribute(text: &str) -> Option<Self> {
        text.trim().parse().ok()
    }
}

impl FromAttribute for i32 {
    fn from_attribute(text: &str) -> Option<Self> {
        text.trim().parse().ok()
    }
}

impl FromAttribute for bool {
    fn from_attribute(text: &str) -> Option<Self> {
        match text.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }
}

impl FromAttribute for String {
    fn from_attribute(text: &str) -> Option<Self> {
        Some(text.to_string())
    }
}

impl FromAttribute for Vec2 {
    fn from_attribute(text: &str) -> Option<Self> {
        parse_floats::<2>(text).map(Vec2::from_array)
    }
}

impl FromAttribute for Vec3 {
    fn from_attribute(text: &str) -> Option<Self> {
        parse_floats::<3>(text).map(Vec3::from_array)
    }
}

impl FromAttribute for IVec2 {
    fn from_attribute(text: &str) -> Option<Self> {
        let mut parts = text.split(',');
        let x = parts.next()?.trim().parse().ok()?;
        let y = parts.next()?.trim().parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(IVec2::new(x, y))
    }
}

impl FromAttribute for EulerAngles {
    fn from_attribute(text: &str) -> Option<Self> {
        parse_floats::<3>(text).map(|[yaw, pitch, roll]| EulerAngles::new(yaw, pitch, roll))
    }
}

impl FromAttribute for Rgba8 {
    fn from_attribute(text: &str) -> Option<Self> {
        let channels: Vec<u8> = text
            .split(',')
            .map(|c| c.trim().parse::<u8>().ok())
            .collect::<Option<_>>()?;
        match channels.as_slice() {
            [r, g, b] => Some(Rgba8::new(*r, *g, *b, 255)),
            [r, g, b, a] => Some(Rgba8::new(*r, *g, *b, *a)),
            _ => None,
        }
    }
}

/// Reads `name` from `node`, or returns `default` when the attribute is absent.
pub fn parse_attribute<T: FromAttribute>(node: Node, name: &str, default: T) -> Result<T, DefinitionError> {
    match node.attribute(name) {
        None => Ok(default),
        Some(text) => T::from_attribute(text).ok_or_else(|| DefinitionError::InvalidAttribute {
            element: node.tag_name().name().to_string(),
            attribute: name.to_string(),
            value: text.to_string(),
        }),
    }
}

pub fn first_child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|c| c.is_element() && c.tag_name().name() == name)
}

pub fn children_named<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children().filter(move |c| c.is_element() && c.tag_name().name() == name)
}

pub fn child_elements<'a, 'input: 'a>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children().filter(|c| c.is_element())
}
