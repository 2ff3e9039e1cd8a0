//! Page text rebuilt from glyph positions.
//!
//! Statements are typeset cell by cell: every label and amount is placed with
//! its own `Tm` or `Td`, usually inside one text object. Reading the content
//! stream in order loses both the line breaks and the column gaps, so each
//! shown string is collected with its baseline position and the page is laid
//! out again: one line per baseline, left to right, with a column gap wherever
//! the pen jumps right by more than an em.

use std::collections::BTreeMap;

use lopdf::content::Operation;
use lopdf::{Dictionary, Document, Encoding, Object, ObjectId};

/// Rightward jump, in ems, written as a column gap.
const COLUMN_GAP_EMS: f32 = 1.0;
/// Rightward jump, in ems, written as a word space.
const WORD_GAP_EMS: f32 = 0.15;
/// Baselines closer than this, in ems, share a line.
const SAME_LINE_EMS: f32 = 0.4;
/// Table detection splits cells on runs of two or more spaces.
const COLUMN_GAP: &str = "    ";

/// Glyph advances used when a font carries no `Widths`.
const NARROW_GLYPH_EMS: f32 = 0.5;
const WIDE_GLYPH_EMS: f32 = 1.0;
const MONOSPACE_GLYPH_EMS: f32 = 0.6;

type Matrix = [f32; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

struct Widths {
    first_char: i64,
    ems: Vec<f32>,
}

impl Widths {
    fn get(&self, code: u8) -> f32 {
        usize::try_from(i64::from(code) - self.first_char)
            .ok()
            .and_then(|i| self.ems.get(i).copied())
            .unwrap_or(NARROW_GLYPH_EMS)
    }
}

struct Font<'d> {
    encoding: Encoding<'d>,
    widths: Option<Widths>,
    monospace_ems: Option<f32>,
}

impl<'d> Font<'d> {
    fn load(doc: &'d Document, dict: &'d Dictionary) -> lopdf::Result<Self> {
        let encoding = dict.get_font_encoding(doc)?;
        let widths = match (
            dict.get(b"FirstChar").and_then(Object::as_i64),
            dict.get_deref(b"Widths", doc).and_then(Object::as_array),
        ) {
            (Ok(first_char), Ok(widths)) => Some(Widths {
                first_char,
                ems: widths
                    .iter()
                    .map(|w| w.as_float().unwrap_or(0.0) / 1000.0)
                    .collect(),
            }),
            _ => None,
        };
        let monospace_ems = dict
            .get(b"BaseFont")
            .and_then(Object::as_name)
            .ok()
            .filter(|name| name.starts_with(b"Courier"))
            .map(|_| MONOSPACE_GLYPH_EMS);

        Ok(Self {
            encoding,
            widths,
            monospace_ems,
        })
    }

    /// Advance of a shown string in text space, in ems.
    fn advance_ems(&self, bytes: &[u8], text: &str) -> f32 {
        match (&self.widths, &self.encoding) {
            (Some(widths), Encoding::OneByteEncoding(_)) => {
                bytes.iter().map(|&code| widths.get(code)).sum()
            }
            _ => text.chars().map(|c| self.glyph_ems(c)).sum(),
        }
    }

    fn glyph_ems(&self, c: char) -> f32 {
        match self.monospace_ems {
            Some(ems) => ems,
            None if c.is_ascii() => NARROW_GLYPH_EMS,
            None => WIDE_GLYPH_EMS,
        }
    }
}

/// One shown string and where it landed.
#[derive(Debug)]
struct Fragment {
    x: f32,
    y: f32,
    end_x: f32,
    size: f32,
    text: String,
}

struct TextState<'f, 'd> {
    tm: Matrix,
    tlm: Matrix,
    leading: f32,
    size: f32,
    char_spacing: f32,
    word_spacing: f32,
    h_scale: f32,
    font: Option<&'f Font<'d>>,
}

impl<'f, 'd> TextState<'f, 'd> {
    fn new() -> Self {
        Self {
            tm: IDENTITY,
            tlm: IDENTITY,
            leading: 0.0,
            size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            h_scale: 1.0,
            font: None,
        }
    }

    fn apply(
        &mut self,
        op: &Operation,
        fonts: &'f BTreeMap<Vec<u8>, Font<'d>>,
        out: &mut Vec<Fragment>,
    ) {
        let operands = &op.operands;
        match op.operator.as_str() {
            "BT" => {
                self.tm = IDENTITY;
                self.tlm = IDENTITY;
            }
            "Tf" => {
                self.font = operands
                    .first()
                    .and_then(|o| o.as_name().ok())
                    .and_then(|name| fonts.get(name));
                if let Some(size) = number(operands, 1) {
                    self.size = size;
                }
            }
            "Tc" => self.char_spacing = number(operands, 0).unwrap_or(self.char_spacing),
            "Tw" => self.word_spacing = number(operands, 0).unwrap_or(self.word_spacing),
            "Tz" => self.h_scale = number(operands, 0).map_or(self.h_scale, |s| s / 100.0),
            "TL" => self.leading = number(operands, 0).unwrap_or(self.leading),
            "Td" | "TD" => {
                if let (Some(tx), Some(ty)) = (number(operands, 0), number(operands, 1)) {
                    if op.operator == "TD" {
                        self.leading = -ty;
                    }
                    self.move_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = matrix(operands) {
                    self.tm = m;
                    self.tlm = m;
                }
            }
            "T*" => self.move_line(0.0, -self.leading),
            "Tj" => self.show_operand(operands.first(), out),
            "'" => {
                self.move_line(0.0, -self.leading);
                self.show_operand(operands.first(), out);
            }
            "\"" => {
                self.word_spacing = number(operands, 0).unwrap_or(self.word_spacing);
                self.char_spacing = number(operands, 1).unwrap_or(self.char_spacing);
                self.move_line(0.0, -self.leading);
                self.show_operand(operands.get(2), out);
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    for item in items {
                        match item {
                            Object::String(bytes, _) => self.show(bytes, out),
                            other => {
                                if let Ok(adjust) = other.as_float() {
                                    self.advance(-adjust / 1000.0 * self.size * self.h_scale);
                                }
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    /// `Td`: start a new line offset from the start of the current one.
    fn move_line(&mut self, tx: f32, ty: f32) {
        let [a, b, c, d, e, f] = self.tlm;
        self.tlm = [a, b, c, d, tx * a + ty * c + e, tx * b + ty * d + f];
        self.tm = self.tlm;
    }

    fn advance(&mut self, tx: f32) {
        self.tm[4] += tx * self.tm[0];
        self.tm[5] += tx * self.tm[1];
    }

    fn show_operand(&mut self, operand: Option<&Object>, out: &mut Vec<Fragment>) {
        if let Some(Object::String(bytes, _)) = operand {
            self.show(bytes, out);
        }
    }

    fn show(&mut self, bytes: &[u8], out: &mut Vec<Fragment>) {
        let Some(font) = self.font else {
            return;
        };
        let text = match Document::decode_text(&font.encoding, bytes) {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!(error = %e, "skipping undecodable text run");
                return;
            }
        };

        let glyphs = text.chars().fold(0.0_f32, |n, _| n + 1.0);
        let spaces = text.chars().filter(|&c| c == ' ').fold(0.0_f32, |n, _| n + 1.0);
        let advance = (font.advance_ems(bytes, &text) * self.size
            + self.char_spacing * glyphs
            + self.word_spacing * spaces)
            * self.h_scale;

        let (x, y) = (self.tm[4], self.tm[5]);
        let size = self.size * self.tm[2].hypot(self.tm[3]);
        self.advance(advance);
        if !text.is_empty() {
            out.push(Fragment {
                x,
                y,
                end_x: self.tm[4],
                size,
                text,
            });
        }
    }
}

fn number(operands: &[Object], index: usize) -> Option<f32> {
    operands.get(index).and_then(|o| o.as_float().ok())
}

fn matrix(operands: &[Object]) -> Option<Matrix> {
    let mut m = IDENTITY;
    for (i, slot) in m.iter_mut().enumerate() {
        *slot = number(operands, i)?;
    }
    Some(m)
}

fn page_fonts(doc: &Document, page_id: ObjectId) -> lopdf::Result<BTreeMap<Vec<u8>, Font<'_>>> {
    Ok(doc
        .get_page_fonts(page_id)?
        .into_iter()
        .filter_map(|(name, dict)| match Font::load(doc, dict) {
            Ok(font) => Some((name, font)),
            Err(e) => {
                tracing::debug!(
                    font = %String::from_utf8_lossy(&name),
                    error = %e,
                    "font has no usable encoding"
                );
                None
            }
        })
        .collect())
}

/// Text of one page, laid out from glyph positions.
///
/// Lines run top to bottom; within a line, fragments run left to right and
/// are separated by four spaces where the gap between them is a column gap.
pub(crate) fn page_text(doc: &Document, page_id: ObjectId) -> lopdf::Result<String> {
    let fonts = page_fonts(doc, page_id)?;
    let content = doc.get_and_decode_page_content(page_id)?;

    let mut state = TextState::new();
    let mut fragments = Vec::new();
    for op in &content.operations {
        state.apply(op, &fonts, &mut fragments);
    }
    Ok(lay_out(fragments))
}

fn lay_out(mut fragments: Vec<Fragment>) -> String {
    fragments.sort_by(|a, b| b.y.total_cmp(&a.y));

    let mut lines: Vec<Vec<Fragment>> = Vec::new();
    for fragment in fragments {
        match lines.last_mut() {
            Some(line) if (line[0].y - fragment.y).abs() <= SAME_LINE_EMS * line[0].size.max(1.0) => {
                line.push(fragment);
            }
            _ => lines.push(vec![fragment]),
        }
    }

    lines.into_iter().map(render_line).collect::<Vec<_>>().join("\n")
}

fn render_line(mut line: Vec<Fragment>) -> String {
    line.sort_by(|a, b| a.x.total_cmp(&b.x));

    let mut out = String::new();
    let mut pen: Option<f32> = None;
    for fragment in line {
        if let Some(end) = pen {
            let gap = fragment.x - end;
            let em = fragment.size.max(1.0);
            if gap > COLUMN_GAP_EMS * em {
                out.push_str(COLUMN_GAP);
            } else if gap > WORD_GAP_EMS * em
                && !out.ends_with(char::is_whitespace)
                && !fragment.text.starts_with(char::is_whitespace)
            {
                out.push(' ');
            }
        }
        out.push_str(&fragment.text);
        pen = Some(pen.map_or(fragment.end_x, |end| end.max(fragment.end_x)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(x: f32, y: f32, width: f32, text: &str) -> Fragment {
        Fragment {
            x,
            y,
            end_x: x + width,
            size: 10.0,
            text: text.to_string(),
        }
    }

    #[test]
    fn cells_on_one_baseline_get_column_gaps() {
        let text = lay_out(vec![
            fragment(300.0, 700.0, 24.0, "2024"),
            fragment(40.0, 700.0, 42.0, "Revenue"),
            fragment(400.0, 700.0, 54.0, "4,500,000"),
        ]);
        assert_eq!(text, "Revenue    2024    4,500,000");
    }

    #[test]
    fn baselines_become_lines_top_down() {
        let text = lay_out(vec![
            fragment(40.0, 686.0, 42.0, "Revenue"),
            fragment(40.0, 700.0, 30.0, "Item"),
            fragment(300.0, 699.0, 24.0, "2024"),
        ]);
        assert_eq!(text.lines().collect::<Vec<_>>(), vec!["Item    2024", "Revenue"]);
    }

    #[test]
    fn small_jump_is_a_word_space_and_touching_runs_join() {
        let text = lay_out(vec![
            fragment(40.0, 700.0, 20.0, "Net"),
            fragment(63.0, 700.0, 30.0, "income"),
            fragment(93.0, 700.0, 5.0, "s"),
        ]);
        assert_eq!(text, "Net incomes");
    }

    #[test]
    fn td_moves_relative_to_line_start() {
        let mut state = TextState::new();
        state.move_line(40.0, 700.0);
        state.advance(50.0);
        state.move_line(0.0, -14.0);
        assert!((state.tm[4] - 40.0).abs() < f32::EPSILON);
        assert!((state.tm[5] - 686.0).abs() < f32::EPSILON);
    }
}
