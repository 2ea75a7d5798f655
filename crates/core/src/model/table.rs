//! Tables (`a:tbl` inside a `p:graphicFrame`).

use super::text::{TextFrame, TextFrameMut};
use crate::xml::XmlElement;

/// A table grid.
#[derive(Debug, Clone, Copy)]
pub struct Table<'a> {
    tbl: &'a XmlElement,
}

impl<'a> Table<'a> {
    pub fn new(tbl: &'a XmlElement) -> Self {
        Self { tbl }
    }

    pub fn row_count(&self) -> usize {
        self.tbl.children_named("tr").count()
    }

    /// Column count from the grid definition, or the widest row without one.
    pub fn column_count(&self) -> usize {
        let grid = self
            .tbl
            .child("tblGrid")
            .map(|grid| grid.children_named("gridCol").count())
            .unwrap_or(0);
        if grid > 0 {
            return grid;
        }
        self.tbl
            .children_named("tr")
            .map(|tr| tr.children_named("tc").count())
            .max()
            .unwrap_or(0)
    }

    /// Every cell with its row and column position.
    pub fn cells(&self) -> Vec<(usize, usize, Cell<'a>)> {
        self.tbl
            .children_named("tr")
            .enumerate()
            .flat_map(|(row, tr)| {
                tr.children_named("tc")
                    .enumerate()
                    .map(move |(col, tc)| (row, col, Cell { tc }))
            })
            .collect()
    }
}

/// A single table cell (`a:tc`).
#[derive(Debug, Clone, Copy)]
pub struct Cell<'a> {
    tc: &'a XmlElement,
}

impl<'a> Cell<'a> {
    /// Whether this cell is covered by a horizontal or vertical merge.
    pub fn is_spanned(&self) -> bool {
        let merged = |key: &str| matches!(self.tc.attr(key), Some("1") | Some("true"));
        merged("hMerge") || merged("vMerge")
    }

    pub fn text_frame(&self) -> Option<TextFrame<'a>> {
        self.tc.child("txBody").map(TextFrame::new)
    }

    pub fn text(&self) -> String {
        self.text_frame().map(|f| f.text()).unwrap_or_default()
    }
}

/// Mutable access to a table's cell text.
#[derive(Debug)]
pub struct TableMut<'a> {
    tbl: &'a mut XmlElement,
}

impl<'a> TableMut<'a> {
    pub fn new(tbl: &'a mut XmlElement) -> Self {
        Self { tbl }
    }

    pub fn text_frames_mut(&mut self) -> Vec<TextFrameMut<'_>> {
        self.tbl
            .children_named_mut("tr")
            .flat_map(|tr| tr.children_named_mut("tc"))
            .filter_map(|tc| tc.child_mut("txBody"))
            .map(TextFrameMut::new)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::XmlDocument;

    const TABLE: &str = r#"<a:tbl xmlns:a="a"><a:tblGrid><a:gridCol w="1"/><a:gridCol w="1"/></a:tblGrid>
<a:tr><a:tc gridSpan="2"><a:txBody><a:bodyPr/><a:p><a:r><a:t> Header </a:t></a:r></a:p></a:txBody></a:tc><a:tc hMerge="1"><a:txBody><a:bodyPr/><a:p/></a:txBody></a:tc></a:tr>
<a:tr><a:tc><a:txBody><a:bodyPr/><a:p><a:r><a:t>a</a:t></a:r></a:p></a:txBody></a:tc><a:tc><a:txBody><a:bodyPr/><a:p><a:r><a:t>b</a:t></a:r></a:p></a:txBody></a:tc></a:tr></a:tbl>"#;

    #[test]
    fn test_table_shape_and_cells() {
        let doc = XmlDocument::parse(TABLE).unwrap();
        let table = Table::new(&doc.root);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_count(), 2);

        let cells: Vec<_> = table
            .cells()
            .into_iter()
            .map(|(r, c, cell)| (r, c, cell.is_spanned(), cell.text()))
            .collect();
        assert_eq!(
            cells,
            vec![
                (0, 0, false, " Header ".to_string()),
                (0, 1, true, String::new()),
                (1, 0, false, "a".to_string()),
                (1, 1, false, "b".to_string()),
            ]
        );
    }

    #[test]
    fn test_text_frames_mut_visits_every_cell() {
        let mut doc = XmlDocument::parse(TABLE).unwrap();
        let mut table = TableMut::new(&mut doc.root);
        let mut frames = table.text_frames_mut();
        assert_eq!(frames.len(), 4);
        frames[2].set_text("changed");
        drop(frames);
        assert_eq!(Table::new(&doc.root).cells()[2].2.text(), "changed");
    }
}
