/// Slicer G-code ingestion into layered toolpath segments
use nalgebra::Point3;
use nom::{
    character::complete::{char, satisfy, space0, u32 as decimal},
    combinator::opt,
    multi::many0,
    number::complete::float,
    sequence::{preceded, terminated},
    IResult,
};
use tracing::{debug, trace};

use crate::error::ToolpathError;
use crate::geometry::Aabb;

/// Tolerance for comparing layer heights.
const LAYER_EPSILON: f32 = 1e-4;
/// Thinnest layer; smaller Z rises (spiral vase output) stay in the current layer.
const MIN_LAYER_HEIGHT: f32 = 0.05;
/// Largest angle one flattened arc piece may sweep, in radians.
const ARC_STEP: f32 = std::f32::consts::PI / 18.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// Non-extruding move
    Travel,
    /// Move that deposits material
    Extrude,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolpathSegment {
    pub start: Point3<f32>,
    pub end: Point3<f32>,
    pub layer: usize,
    pub kind: SegmentKind,
}

/// Ordered nozzle moves grouped into contiguous layers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Toolpath {
    segments: Vec<ToolpathSegment>,
    layer_starts: Vec<usize>,
    layer_heights: Vec<f32>,
}

impl Toolpath {
    pub fn segments(&self) -> &[ToolpathSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of layers that contain at least one extrusion.
    pub fn layer_count(&self) -> usize {
        self.layer_heights.len()
    }

    /// Z of each layer's first extrusion.
    pub fn layer_heights(&self) -> &[f32] {
        &self.layer_heights
    }

    pub fn layer_height(&self, layer: usize) -> Option<f32> {
        self.layer_heights.get(layer).copied()
    }

    /// Segments of a single layer, including the travels that follow its extrusions.
    pub fn layer(&self, layer: usize) -> Option<&[ToolpathSegment]> {
        let start = *self.layer_starts.get(layer)?;
        Some(&self.segments[start..self.layer_end(layer)])
    }

    /// Every segment from the first layer through `layer`; clamps past the last layer.
    pub fn up_to_layer(&self, layer: usize) -> &[ToolpathSegment] {
        if self.layer_starts.is_empty() {
            return &self.segments;
        }
        let last = layer.min(self.layer_starts.len() - 1);
        &self.segments[..self.layer_end(last)]
    }

    /// Bounds of the extruded material.
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(
            self.segments
                .iter()
                .filter(|s| s.kind == SegmentKind::Extrude)
                .flat_map(|s| [&s.start, &s.end]),
        )
    }

    fn layer_end(&self, layer: usize) -> usize {
        self.layer_starts
            .get(layer + 1)
            .copied()
            .unwrap_or(self.segments.len())
    }

    fn push(&mut self, start: Point3<f32>, end: Point3<f32>, kind: SegmentKind) {
        if kind == SegmentKind::Extrude {
            let z = end.z;
            match self.layer_heights.last() {
                None => {
                    self.layer_starts.push(0);
                    self.layer_heights.push(z);
                }
                Some(&current) if z - current >= MIN_LAYER_HEIGHT - LAYER_EPSILON => {
                    self.layer_starts.push(self.segments.len());
                    self.layer_heights.push(z);
                }
                Some(_) => {}
            }
        }
        let layer = self.layer_heights.len().saturating_sub(1);
        self.segments.push(ToolpathSegment {
            start,
            end,
            layer,
            kind,
        });
    }
}

/// Interpreter state carried between lines.
#[derive(Debug, Clone, Copy)]
struct Machine {
    position: Point3<f32>,
    extruder: f32,
    absolute: bool,
    absolute_extrusion: bool,
}

impl Default for Machine {
    fn default() -> Self {
        Self {
            position: Point3::origin(),
            extruder: 0.0,
            absolute: true,
            absolute_extrusion: true,
        }
    }
}

impl Machine {
    /// Applies the X/Y/Z/E words of a move; returns the target and the extruded length.
    fn target(&mut self, words: &[(char, f32)]) -> (Point3<f32>, f32) {
        let mut target = self.position;
        let mut extruded = 0.0;
        for &(letter, value) in words {
            let axis = match letter {
                'X' => 0,
                'Y' => 1,
                'Z' => 2,
                'E' => {
                    extruded = if self.absolute_extrusion {
                        value - self.extruder
                    } else {
                        value
                    };
                    self.extruder += extruded;
                    continue;
                }
                _ => continue,
            };
            target[axis] = if self.absolute {
                value
            } else {
                self.position[axis] + value
            };
        }
        (target, extruded)
    }

    fn linear_move(&mut self, words: &[(char, f32)], toolpath: &mut Toolpath) {
        let (target, extruded) = self.target(words);

        // Retracts and primes without motion draw nothing
        if target != self.position {
            toolpath.push(self.position, target, move_kind(extruded));
            self.position = target;
        }
    }

    /// `G2` (clockwise) or `G3` arc in the XY plane, flattened into pieces of
    /// at most [`ARC_STEP`]. The center comes from `I`/`J` offsets or an `R`
    /// radius; an arc with neither is drawn as a straight move.
    fn arc_move(&mut self, words: &[(char, f32)], clockwise: bool, toolpath: &mut Toolpath) {
        let start = self.position;
        let (target, extruded) = self.target(words);
        let offset = |letter| words.iter().rev().find(|(l, _)| *l == letter).map(|&(_, v)| v);

        let center = match (offset('I'), offset('J'), offset('R')) {
            (None, None, None) => None,
            (None, None, Some(radius)) => arc_center_from_radius(start, target, radius, clockwise),
            (i, j, _) => Some((
                start.x + i.unwrap_or(0.0),
                start.y + j.unwrap_or(0.0),
            )),
        };
        let kind = move_kind(extruded);
        let Some((cx, cy)) = center else {
            if target != start {
                toolpath.push(start, target, kind);
                self.position = target;
            }
            return;
        };

        let radius = (start.x - cx).hypot(start.y - cy);
        let from = (start.y - cy).atan2(start.x - cx);
        let to = (target.y - cy).atan2(target.x - cx);
        let mut sweep = to - from;
        if clockwise && sweep >= 0.0 {
            sweep -= std::f32::consts::TAU;
        } else if !clockwise && sweep <= 0.0 {
            sweep += std::f32::consts::TAU;
        }

        let pieces = (sweep.abs() / ARC_STEP).ceil().max(1.0) as usize;
        let mut previous = start;
        for k in 1..=pieces {
            let point = if k == pieces {
                target
            } else {
                let t = k as f32 / pieces as f32;
                let angle = from + sweep * t;
                Point3::new(
                    cx + radius * angle.cos(),
                    cy + radius * angle.sin(),
                    start.z + (target.z - start.z) * t,
                )
            };
            toolpath.push(previous, point, kind);
            previous = point;
        }
        self.position = target;
    }

    /// `G28`: homes the named axes, or all of them when none are named.
    fn home(&mut self, axes: &[char]) {
        let all = axes.is_empty();
        for (index, letter) in ['X', 'Y', 'Z'].into_iter().enumerate() {
            if all || axes.contains(&letter) {
                self.position[index] = 0.0;
            }
        }
    }

    fn set_position(&mut self, words: &[(char, f32)]) {
        if words.is_empty() {
            self.position = Point3::origin();
            self.extruder = 0.0;
            return;
        }
        for &(letter, value) in words {
            match letter {
                'X' => self.position.x = value,
                'Y' => self.position.y = value,
                'Z' => self.position.z = value,
                'E' => self.extruder = value,
                _ => {}
            }
        }
    }
}

fn move_kind(extruded: f32) -> SegmentKind {
    if extruded > 0.0 {
        SegmentKind::Extrude
    } else {
        SegmentKind::Travel
    }
}

/// Center of the arc of `radius` from `start` to `end`; a negative radius
/// picks the longer of the two arcs. `None` when no such arc exists.
fn arc_center_from_radius(
    start: Point3<f32>,
    end: Point3<f32>,
    radius: f32,
    clockwise: bool,
) -> Option<(f32, f32)> {
    let (dx, dy) = (end.x - start.x, end.y - start.y);
    let chord = dx.hypot(dy);
    let half = chord / 2.0;
    if chord == 0.0 || radius.abs() < half {
        return None;
    }
    let height = (radius * radius - half * half).sqrt();
    let side = if clockwise == (radius > 0.0) { -1.0 } else { 1.0 };
    // Unit normal to the left of the chord
    let (nx, ny) = (-dy / chord, dx / chord);
    Some((
        start.x + dx / 2.0 + nx * height * side,
        start.y + dy / 2.0 + ny * height * side,
    ))
}

/// Parses slicer G-code into a [`Toolpath`].
///
/// Understands `G0`/`G1` moves, `G2`/`G3` arcs, `G28` homing, `G90`/`G91`,
/// `M82`/`M83` and `G92`. Other commands (including subcoded ones such as
/// `G92.1`), blank lines and `;` comments are skipped.
pub fn parse_gcode(text: &str) -> Result<Toolpath, ToolpathError> {
    let mut machine = Machine::default();
    let mut toolpath = Toolpath::default();

    for (index, raw) in text.lines().enumerate() {
        let code = raw.split(';').next().unwrap_or("").trim();
        if code.is_empty() {
            continue;
        }

        let malformed = || ToolpathError::Malformed {
            line: index + 1,
            text: raw.to_string(),
        };

        let (rest, (letter, number)) = match command(code) {
            Ok((rest, (letter, number, None))) => (rest, (letter, number)),
            _ => {
                trace!(line = index + 1, code, "skipping unrecognized line");
                continue;
            }
        };

        match (letter, number) {
            ('G', 0 | 1 | 2 | 3 | 92) => {
                let params = match words(rest) {
                    Ok(("", params)) => params,
                    _ => return Err(malformed()),
                };
                match number {
                    92 => machine.set_position(&params),
                    2 | 3 => machine.arc_move(&params, number == 2, &mut toolpath),
                    _ => machine.linear_move(&params, &mut toolpath),
                }
            }
            ('G', 28) => match axis_letters(rest) {
                Ok(("", axes)) => machine.home(&axes),
                _ => return Err(malformed()),
            },
            ('G', 90) => {
                machine.absolute = true;
                machine.absolute_extrusion = true;
            }
            ('G', 91) => {
                machine.absolute = false;
                machine.absolute_extrusion = false;
            }
            ('M', 82) => machine.absolute_extrusion = true,
            ('M', 83) => machine.absolute_extrusion = false,
            _ => {}
        }
    }

    debug!(
        segments = toolpath.len(),
        layers = toolpath.layer_count(),
        "parsed G-code toolpath"
    );
    Ok(toolpath)
}

/// `G92.1` -> `('G', 92, Some(1))`
fn command(input: &str) -> IResult<&str, (char, u32, Option<u32>)> {
    let (input, letter) = satisfy(|c| c.is_ascii_alphabetic())(input)?;
    let (input, number) = decimal(input)?;
    let (input, subcode) = opt(preceded(char('.'), decimal))(input)?;
    Ok((input, (letter.to_ascii_uppercase(), number, subcode)))
}

fn word(input: &str) -> IResult<&str, (char, f32)> {
    let (input, letter) = preceded(space0, satisfy(|c| c.is_ascii_alphabetic()))(input)?;
    let (input, value) = float(input)?;
    Ok((input, (letter.to_ascii_uppercase(), value)))
}

fn words(input: &str) -> IResult<&str, Vec<(char, f32)>> {
    let (input, words) = many0(word)(input)?;
    let (input, _) = space0(input)?;
    Ok((input, words))
}

/// Axis letters of `G28`, whose values (if any) are ignored.
fn axis_letters(input: &str) -> IResult<&str, Vec<char>> {
    let axis = preceded(space0, satisfy(|c| c.is_ascii_alphabetic()));
    let (input, axes) = many0(terminated(axis, opt(float)))(input)?;
    let (input, _) = space0(input)?;
    Ok((input, axes.into_iter().map(|c| c.to_ascii_uppercase()).collect()))
}
