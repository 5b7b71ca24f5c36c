//! Splitting a row into runs of identically styled cells

use tern_core::{Attr, Cell};

use crate::model::TermModel;

/// Bytes of text one run may carry before it is flushed
pub const RUN_BYTES: usize = 20 * 1024;

/// Room kept free for one more encoded character
const CHAR_BYTES: usize = 4;

/// Cells drawn with one call
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    /// First column
    pub col: usize,
    /// Columns covered, wide characters counting twice
    pub columns: usize,
    /// Style of every cell in the run; its codepoint is the first one's
    pub base: Cell,
    pub text: String,
}

/// Split `row` into runs. Cells for which `selected` holds are drawn with
/// the reverse bit flipped, so a selection boundary also ends a run.
pub fn row_runs<M, S>(model: &M, row: usize, selected: S) -> Vec<Run>
where
    M: TermModel + ?Sized,
    S: Fn(usize) -> bool,
{
    let mut runs = Vec::new();
    let mut current: Option<Run> = None;

    for col in 0..model.cols() {
        let mut cell = model.cell_at(col, row);
        if cell.attr.contains(Attr::WDUMMY) {
            continue;
        }
        if selected(col) {
            cell.attr.toggle(Attr::REVERSE);
        }

        if let Some(run) = current.take() {
            if !run.base.same_style(&cell) || run.text.len() >= RUN_BYTES - CHAR_BYTES {
                runs.push(run);
            } else {
                current = Some(run);
            }
        }

        let run = current.get_or_insert_with(|| Run {
            col,
            columns: 0,
            base: cell,
            text: String::new(),
        });
        run.text.push(cell.c);
        run.columns += if cell.attr.contains(Attr::WIDE) { 2 } else { 1 };
    }

    runs.extend(current);
    runs
}
