/// Typed uniform values, targets and colors
use lv3d_core::Matrix4;

use crate::backend::UniformData;

/// GPU location of a uniform or attribute, or [`Location::NOT_FOUND`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location(pub i32);

impl Location {
    /// Returned for names the linked program does not declare.
    pub const NOT_FOUND: Location = Location(-1);

    pub fn from_index(index: u32) -> Self {
        i32::try_from(index).map_or(Self::NOT_FOUND, Location)
    }

    pub fn is_found(self) -> bool {
        self.0 >= 0
    }

    pub fn index(self) -> Option<u32> {
        u32::try_from(self.0).ok()
    }
}

/// Where `set_uniform` writes: a name resolved through the cache, or a known location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformTarget<'a> {
    Name(&'a str),
    Location(Location),
}

impl<'a> From<&'a str> for UniformTarget<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

impl<'a> From<&'a String> for UniformTarget<'a> {
    fn from(name: &'a String) -> Self {
        Self::Name(name)
    }
}

impl From<Location> for UniformTarget<'_> {
    fn from(location: Location) -> Self {
        Self::Location(location)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorRgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl ColorRgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Self::new(channel(r), channel(g), channel(b))
    }

    pub fn with_alpha(self, a: f32) -> ColorRgba {
        ColorRgba::new(self.r, self.g, self.b, a)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorRgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ColorRgba {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_u8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::new(channel(r), channel(g), channel(b), channel(a))
    }
}

fn channel(value: u8) -> f32 {
    value as f32 / 255.0
}

/// Everything `set_uniform` accepts.
///
/// Double-precision values are narrowed to `f32` on upload and booleans are
/// written as `0`/`1` ints. Matrices are column-major.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue<'a> {
    Int(i32),
    Bool(bool),
    Float(f32),
    Double(f64),
    IVec2([i32; 2]),
    IVec3([i32; 3]),
    IVec4([i32; 4]),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    DVec2([f64; 2]),
    DVec3([f64; 3]),
    DVec4([f64; 4]),
    /// One to four floats; any other length is skipped.
    FloatArray(&'a [f32]),
    Mat3([f32; 9]),
    DMat3([f64; 9]),
    Mat4([f32; 16]),
    DMat4([f64; 16]),
    Rgb(ColorRgb),
    Rgba(ColorRgba),
}

impl UniformValue<'_> {
    /// The GPU payload, or `None` when the value has no uniform form.
    pub fn to_data(&self) -> Option<UniformData> {
        let data = match *self {
            Self::Int(x) => UniformData::Int1(x),
            Self::Bool(b) => UniformData::Int1(i32::from(b)),
            Self::Float(x) => UniformData::Float1(x),
            Self::Double(x) => UniformData::Float1(x as f32),
            Self::IVec2(v) => UniformData::Int2(v),
            Self::IVec3(v) => UniformData::Int3(v),
            Self::IVec4(v) => UniformData::Int4(v),
            Self::Vec2(v) => UniformData::Float2(v),
            Self::Vec3(v) => UniformData::Float3(v),
            Self::Vec4(v) => UniformData::Float4(v),
            Self::DVec2(v) => UniformData::Float2(v.map(|x| x as f32)),
            Self::DVec3(v) => UniformData::Float3(v.map(|x| x as f32)),
            Self::DVec4(v) => UniformData::Float4(v.map(|x| x as f32)),
            Self::FloatArray(values) => match *values {
                [x] => UniformData::Float1(x),
                [x, y] => UniformData::Float2([x, y]),
                [x, y, z] => UniformData::Float3([x, y, z]),
                [x, y, z, w] => UniformData::Float4([x, y, z, w]),
                _ => return None,
            },
            Self::Mat3(m) => UniformData::Mat3(m),
            Self::DMat3(m) => UniformData::Mat3(m.map(|x| x as f32)),
            Self::Mat4(m) => UniformData::Mat4(m),
            Self::DMat4(m) => UniformData::Mat4(m.map(|x| x as f32)),
            Self::Rgb(c) => UniformData::Float3([c.r, c.g, c.b]),
            Self::Rgba(c) => UniformData::Float4([c.r, c.g, c.b, c.a]),
        };
        Some(data)
    }
}

macro_rules! uniform_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for UniformValue<'_> {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

uniform_from! {
    i32 => Int,
    bool => Bool,
    f32 => Float,
    f64 => Double,
    [i32; 2] => IVec2,
    [i32; 3] => IVec3,
    [i32; 4] => IVec4,
    [f32; 2] => Vec2,
    [f32; 3] => Vec3,
    [f32; 4] => Vec4,
    [f64; 2] => DVec2,
    [f64; 3] => DVec3,
    [f64; 4] => DVec4,
    [f32; 9] => Mat3,
    [f64; 9] => DMat3,
    [f32; 16] => Mat4,
    [f64; 16] => DMat4,
    ColorRgb => Rgb,
    ColorRgba => Rgba,
}

impl<'a> From<&'a [f32]> for UniformValue<'a> {
    fn from(values: &'a [f32]) -> Self {
        Self::FloatArray(values)
    }
}

impl From<Matrix4> for UniformValue<'_> {
    fn from(m: Matrix4) -> Self {
        Self::DMat4(m.to_array())
    }
}

impl From<&Matrix4> for UniformValue<'_> {
    fn from(m: &Matrix4) -> Self {
        Self::DMat4(m.to_array())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_sentinel() {
        assert!(!Location::NOT_FOUND.is_found());
        assert_eq!(Location::NOT_FOUND.index(), None);
        assert_eq!(Location::from_index(3).index(), Some(3));
        assert_eq!(Location::from_index(u32::MAX), Location::NOT_FOUND);
    }

    #[test]
    fn test_doubles_are_narrowed() {
        let value = UniformValue::from([0.1f64, 0.2, 0.3]);
        assert_eq!(value.to_data(), Some(UniformData::Float3([0.1, 0.2, 0.3])));

        let m = Matrix4::IDENTITY.translated(1.5, 0.0, 0.0);
        match UniformValue::from(&m).to_data() {
            Some(UniformData::Mat4(data)) => assert_eq!(data[12], 1.5),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_bool_uploads_as_int() {
        assert_eq!(UniformValue::from(true).to_data(), Some(UniformData::Int1(1)));
        assert_eq!(UniformValue::from(false).to_data(), Some(UniformData::Int1(0)));
    }

    #[test]
    fn test_float_array_lengths() {
        let three = [1.0f32, 2.0, 3.0];
        assert_eq!(
            UniformValue::from(&three[..]).to_data(),
            Some(UniformData::Float3(three))
        );
        let five = [0.0f32; 5];
        assert_eq!(UniformValue::from(&five[..]).to_data(), None);
        assert_eq!(UniformValue::from(&five[..0]).to_data(), None);
    }

    #[test]
    fn test_colors() {
        let c = ColorRgba::from_u8(255, 0, 51, 255);
        assert_eq!(c, ColorRgba::new(1.0, 0.0, 0.2, 1.0));
        assert_eq!(
            UniformValue::from(ColorRgb::new(0.5, 0.25, 1.0)).to_data(),
            Some(UniformData::Float3([0.5, 0.25, 1.0]))
        );
        assert_eq!(ColorRgb::from_u8(0, 0, 0).with_alpha(0.5).a, 0.5);
    }
}
