/*
MIT License

Copyright (c) 2021, 2022, 2024, 2025 Vincent Hiribarren

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/

//! Typeface files as exported by facetype.js: glyph outlines stored as a
//! string of drawing commands in font units.

use std::collections::HashMap;

use log::warn;
use lyon::geom::point;
use lyon::math::{Point, Vector, vector};
use lyon::path::Path;
use serde::Deserialize;

use crate::assets::AssetLoadError;

const FALLBACK_GLYPH: char = '?';

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub x_min: f32,
    pub x_max: f32,
    pub y_min: f32,
    pub y_max: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Glyph {
    /// Horizontal advance.
    pub ha: f32,
    /// Outline commands, absent for blank glyphs such as the space.
    #[serde(default)]
    pub o: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Typeface {
    pub glyphs: HashMap<String, Glyph>,
    #[serde(default)]
    pub family_name: String,
    pub resolution: f32,
    pub bounding_box: BoundingBox,
    #[serde(default)]
    pub underline_thickness: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutlineCommand {
    MoveTo(Point),
    LineTo(Point),
    QuadraticTo { ctrl: Point, to: Point },
    CubicTo { ctrl1: Point, ctrl2: Point, to: Point },
    Close,
}

/// Parses an outline such as `m 0 0 l 10 0 q 20 10 15 0`.
///
/// Curves list their end point first, then their control points.
pub fn parse_outline(outline: &str) -> Result<Vec<OutlineCommand>, AssetLoadError> {
    let mut tokens = outline.split_whitespace();
    let mut commands = Vec::new();
    let next_point = |tokens: &mut std::str::SplitWhitespace<'_>,
                      command: &str|
     -> Result<Point, AssetLoadError> {
        let mut coordinate = || -> Result<f32, AssetLoadError> {
            let token = tokens.next().ok_or_else(|| {
                AssetLoadError::Outline(format!("missing coordinate for '{command}'"))
            })?;
            token
                .parse::<f32>()
                .map_err(|_| AssetLoadError::Outline(format!("invalid coordinate '{token}'")))
        };
        Ok(point(coordinate()?, coordinate()?))
    };
    while let Some(command) = tokens.next() {
        let parsed = match command {
            "m" => OutlineCommand::MoveTo(next_point(&mut tokens, command)?),
            "l" => OutlineCommand::LineTo(next_point(&mut tokens, command)?),
            "q" => {
                let to = next_point(&mut tokens, command)?;
                let ctrl = next_point(&mut tokens, command)?;
                OutlineCommand::QuadraticTo { ctrl, to }
            }
            "b" => {
                let to = next_point(&mut tokens, command)?;
                let ctrl1 = next_point(&mut tokens, command)?;
                let ctrl2 = next_point(&mut tokens, command)?;
                OutlineCommand::CubicTo { ctrl1, ctrl2, to }
            }
            "z" => OutlineCommand::Close,
            other => {
                return Err(AssetLoadError::Outline(format!(
                    "unknown outline command '{other}'"
                )));
            }
        };
        commands.push(parsed);
    }
    Ok(commands)
}

impl Typeface {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, AssetLoadError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn glyph(&self, c: char) -> Option<&Glyph> {
        self.glyphs.get(c.encode_utf8(&mut [0; 4]) as &str)
    }

    #[must_use]
    pub fn scale_for(&self, size: f32) -> f32 {
        if self.resolution > 0.0 {
            size / self.resolution
        } else {
            size
        }
    }

    #[must_use]
    pub fn line_height(&self, size: f32) -> f32 {
        let bbox = &self.bounding_box;
        (bbox.y_max - bbox.y_min + self.underline_thickness) * self.scale_for(size)
    }

    /// Lays out `text` on a baseline starting at the origin, one closed
    /// sub-path per glyph contour. `\n` starts a new line below.
    pub fn build_path(&self, text: &str, size: f32) -> Result<Path, AssetLoadError> {
        let scale = self.scale_for(size);
        let line_height = self.line_height(size);
        let mut builder = Path::builder();
        let mut offset = vector(0.0, 0.0);
        for c in text.chars() {
            if c == '\n' {
                offset = vector(0.0, offset.y - line_height);
                continue;
            }
            let glyph = match self.glyph(c) {
                Some(glyph) => glyph,
                None => {
                    warn!(
                        "Character '{c}' does not exist in typeface {}",
                        self.family_name
                    );
                    let Some(fallback) = self.glyph(FALLBACK_GLYPH) else {
                        continue;
                    };
                    fallback
                }
            };
            if let Some(outline) = &glyph.o {
                let commands = parse_outline(outline)?;
                append_outline(&mut builder, &commands, scale, offset)?;
            }
            offset.x += glyph.ha * scale;
        }
        Ok(builder.build())
    }
}

fn append_outline(
    builder: &mut lyon::path::path::Builder,
    commands: &[OutlineCommand],
    scale: f32,
    offset: Vector,
) -> Result<(), AssetLoadError> {
    let place = |p: Point| point(p.x * scale + offset.x, p.y * scale + offset.y);
    let mut open = false;
    for command in commands {
        match *command {
            OutlineCommand::MoveTo(to) => {
                if open {
                    builder.close();
                }
                builder.begin(place(to));
                open = true;
            }
            OutlineCommand::Close => {
                if open {
                    builder.close();
                    open = false;
                }
            }
            _ if !open => {
                return Err(AssetLoadError::Outline(
                    "drawing command before any move".to_string(),
                ));
            }
            OutlineCommand::LineTo(to) => {
                builder.line_to(place(to));
            }
            OutlineCommand::QuadraticTo { ctrl, to } => {
                builder.quadratic_bezier_to(place(ctrl), place(to));
            }
            OutlineCommand::CubicTo { ctrl1, ctrl2, to } => {
                builder.cubic_bezier_to(place(ctrl1), place(ctrl2), place(to));
            }
        }
    }
    if open {
        builder.close();
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lyon::path::Event;

    pub(crate) const SQUARE_TYPEFACE: &str = r#"{
        "glyphs": {
            "A": { "ha": 120, "x_min": 0, "x_max": 100, "o": "m 0 0 l 100 0 l 100 100 l 0 100 l 0 0" },
            "O": { "ha": 120, "o": "m 0 0 l 100 0 l 100 100 l 0 100 z m 25 25 l 75 25 l 75 75 l 25 75 z" },
            "?": { "ha": 50, "o": "m 0 0 l 10 0 l 10 10 z" },
            " ": { "ha": 60 }
        },
        "familyName": "Squares",
        "resolution": 1000,
        "boundingBox": { "xMin": 0, "xMax": 100, "yMin": -20, "yMax": 100 },
        "underlineThickness": 10
    }"#;

    fn typeface() -> Typeface {
        Typeface::from_slice(SQUARE_TYPEFACE.as_bytes()).unwrap()
    }

    fn begin_points(path: &Path) -> Vec<Point> {
        path.iter()
            .filter_map(|event| match event {
                Event::Begin { at } => Some(at),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn parses_every_command() {
        let commands = parse_outline("m 1 2 l 3 4 q 5 6 7 8 b 9 10 11 12 13 14 z").unwrap();
        assert_eq!(
            commands,
            vec![
                OutlineCommand::MoveTo(point(1.0, 2.0)),
                OutlineCommand::LineTo(point(3.0, 4.0)),
                OutlineCommand::QuadraticTo {
                    ctrl: point(7.0, 8.0),
                    to: point(5.0, 6.0)
                },
                OutlineCommand::CubicTo {
                    ctrl1: point(11.0, 12.0),
                    ctrl2: point(13.0, 14.0),
                    to: point(9.0, 10.0)
                },
                OutlineCommand::Close,
            ]
        );
    }

    #[test]
    fn rejects_malformed_outlines() {
        assert!(matches!(
            parse_outline("m 1"),
            Err(AssetLoadError::Outline(_))
        ));
        assert!(matches!(
            parse_outline("m 1 x"),
            Err(AssetLoadError::Outline(_))
        ));
        assert!(matches!(
            parse_outline("k 1 2"),
            Err(AssetLoadError::Outline(_))
        ));
    }

    #[test]
    fn rejects_invalid_json() {
        assert!(matches!(
            Typeface::from_slice(b"{ \"glyphs\": 3 }"),
            Err(AssetLoadError::Typeface(_))
        ));
    }

    #[test]
    fn glyphs_advance_along_the_baseline() {
        let typeface = typeface();
        let path = typeface.build_path("A A", 1.0).unwrap();
        let starts = begin_points(&path);
        assert_eq!(starts.len(), 2);
        assert_eq!(starts[0], point(0.0, 0.0));
        // "A" then the blank space
        assert!((starts[1].x - 0.18).abs() < 1e-6);
    }

    #[test]
    fn new_line_moves_down_and_back() {
        let typeface = typeface();
        let path = typeface.build_path("A\nA", 1.0).unwrap();
        let starts = begin_points(&path);
        assert_eq!(starts.len(), 2);
        assert_eq!(starts[1].x, 0.0);
        assert!((starts[1].y + typeface.line_height(1.0)).abs() < 1e-6);
        assert!((typeface.line_height(1.0) - 0.13).abs() < 1e-6);
    }

    #[test]
    fn unknown_characters_use_the_fallback_glyph() {
        let typeface = typeface();
        let path = typeface.build_path("é", 1.0).unwrap();
        assert_eq!(begin_points(&path), vec![point(0.0, 0.0)]);
    }

    #[test]
    fn glyph_with_hole_has_two_contours() {
        let typeface = typeface();
        let path = typeface.build_path("O", 1.0).unwrap();
        assert_eq!(begin_points(&path).len(), 2);
    }
}
