use printpdf::{BuiltinFont, Mm, PdfDocument};

use crate::error::{RecapError, Result};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 15.0;
const LINE_HEIGHT_MM: f32 = 6.0;
const FONT_SIZE_PT: f32 = 12.0;
const WRAP_COLUMNS: usize = 90;

/// Render text as a downloadable PDF document.
///
/// A4 pages, built-in Helvetica at 12pt, greedy word wrap with page breaks
/// on overflow. Characters outside printable Latin-1 are replaced with `?`
/// since the built-in fonts cannot encode them.
pub fn render_document(text: &str) -> Result<Vec<u8>> {
    let (doc, first_page, first_layer) = PdfDocument::new(
        "transcript",
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "text",
    );
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| RecapError::RenderFailed {
            reason: e.to_string(),
        })?;

    let mut layer = doc.get_page(first_page).get_layer(first_layer);
    let mut y = PAGE_HEIGHT_MM - MARGIN_MM;

    for line in wrap_lines(&sanitize(text), WRAP_COLUMNS) {
        if y < MARGIN_MM {
            let (page, layer_index) =
                doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "text");
            layer = doc.get_page(page).get_layer(layer_index);
            y = PAGE_HEIGHT_MM - MARGIN_MM;
        }
        layer.use_text(line, FONT_SIZE_PT, Mm(MARGIN_MM), Mm(y), &font);
        y -= LINE_HEIGHT_MM;
    }

    doc.save_to_bytes().map_err(|e| RecapError::RenderFailed {
        reason: e.to_string(),
    })
}

fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => ' ',
            c if (' '..='\u{ff}').contains(&c) => c,
            _ => '?',
        })
        .collect()
}

/// Greedy word wrap with a column budget per line.
fn wrap_lines(text: &str, columns: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_cols = 0usize;

    for word in text.split_whitespace() {
        for chunk in char_chunks(word, columns) {
            let chunk_cols = chunk.chars().count();
            if current_cols == 0 {
                current.push_str(&chunk);
                current_cols = chunk_cols;
            } else if current_cols + 1 + chunk_cols <= columns {
                current.push(' ');
                current.push_str(&chunk);
                current_cols += 1 + chunk_cols;
            } else {
                lines.push(std::mem::take(&mut current));
                current.push_str(&chunk);
                current_cols = chunk_cols;
            }
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

/// Split a word into column-sized pieces so oversized tokens still wrap.
fn char_chunks(word: &str, columns: usize) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    chars
        .chunks(columns.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}
