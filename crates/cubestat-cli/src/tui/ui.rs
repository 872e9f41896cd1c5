//! Horizon view rendering.
//!
//! ```text
//! ╔ [8] Total CPU util %...................................  23%|.... 11%| ╗
//! ╚                      ▁▂▂▃▅▃▂▁▁ ▁▂▃▄▅▆▇█▇▆▅▄▃▂▁▁▁▁▂▂▂▂▃▃▄▄▅▅▆▆▇▇██▇▇▆▆ ╝
//!   ╔ CPU 0 util %....................................................  7%| ╗
//!   ╚                                 ▁▂▂▂▃▄▄▅▅▅▆▆▅▅▅▄▄▃▃▂▁▁▁▁▁▁ ▁▁▁▁▁▁▁▁▁ ╝
//! ╚ ...........................-2.00s|...............-1.00s|......-0.00s| ╝
//! ```
//!
//! Text comes from the dashboard's frame layout; this module only maps
//! samples to palette cells and writes them into the buffer. Writes outside
//! the area are skipped, never panicking on a small terminal.

use cubestat_core::layout::{ChartRow, FrameLayout};
use cubestat_core::scale::cell_index;
use cubestat_core::{Dashboard, Group};
use ratatui::prelude::*;

use super::palette::{Cell, Palettes};

pub fn draw(f: &mut Frame, dashboard: &Dashboard, palettes: &Palettes) {
    let area = f.area();
    let frame = dashboard.layout(area.width as usize, area.height as usize);
    f.render_widget(HorizonView::new(&frame, palettes), area);
}

pub struct HorizonView<'a> {
    frame: &'a FrameLayout,
    palettes: &'a Palettes,
}

impl<'a> HorizonView<'a> {
    pub fn new(frame: &'a FrameLayout, palettes: &'a Palettes) -> Self {
        Self { frame, palettes }
    }

    fn cells(&self, group: Group) -> &[Cell] {
        self.palettes.cells(group, self.frame.theme)
    }

    fn render_row(&self, row: &ChartRow, y: u16, area: Rect, buf: &mut Buffer) {
        put_str(buf, area, 0, y, &row.header, Style::default());
        put_str(buf, area, 0, y + 1, &row.footer(self.frame.cols), Style::default());

        let cells = self.cells(row.group);
        if cells.is_empty() {
            return;
        }
        let first = row.first_col(self.frame.cols);
        for (i, &value) in row.window.iter().enumerate() {
            // Cell 0 leaves the blank footer as it is.
            let idx = cell_index(value, row.ceiling, cells.len());
            if idx > 0 {
                let cell = cells[idx];
                put_char(buf, area, first + i, y + 1, cell.glyph, cell.style);
            }
        }
    }
}

impl Widget for HorizonView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, Style::default());
        let mut y = 0u16;
        for row in &self.frame.rows {
            self.render_row(row, y, area, buf);
            y = y.saturating_add(2);
        }
        if let Some(ruler) = &self.frame.time_ruler {
            put_str(buf, area, 0, y, ruler, Style::default());
        }
    }
}

fn put_char(buf: &mut Buffer, area: Rect, x: usize, y: u16, ch: char, style: Style) {
    let Ok(x) = u16::try_from(x) else {
        return;
    };
    if x >= area.width || y >= area.height {
        return;
    }
    if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
        cell.set_char(ch).set_style(style);
    }
}

fn put_str(buf: &mut Buffer, area: Rect, x: usize, y: u16, text: &str, style: Style) {
    for (i, ch) in text.chars().enumerate() {
        put_char(buf, area, x + i, y, ch, style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubestat_core::{Config, Snapshot};

    fn dashboard(values: &[f64]) -> Dashboard {
        let mut d = Dashboard::new(&Config::default(), &[Group::Cpu], 1);
        for &v in values {
            let mut s = Snapshot::new();
            s.push(Group::Cpu, "[1] Total CPU util %", v);
            d.publish(&s);
        }
        d
    }

    fn render(d: &Dashboard, width: u16, height: u16) -> Buffer {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        let frame = d.layout(width as usize, height as usize);
        let palettes = Palettes::new(256);
        HorizonView::new(&frame, &palettes).render(area, &mut buf);
        buf
    }

    fn line(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect()
    }

    #[test]
    fn header_and_borders() {
        let buf = render(&dashboard(&[50.0, 100.0]), 30, 6);
        let header = line(&buf, 0);
        assert!(header.starts_with("╔ [1] Total CPU util %"));
        assert!(header.ends_with("100%| ╗"));
        let chart = line(&buf, 1);
        assert!(chart.starts_with("╚ "));
        assert!(chart.ends_with(" ╝"));
    }

    #[test]
    fn newest_sample_sits_left_of_the_border() {
        let buf = render(&dashboard(&[0.0, 100.0]), 30, 6);
        // 100% of a 25-cell palette is the last (darkest) full block.
        assert_eq!(buf[(27, 1)].symbol(), "█");
        assert_eq!(buf[(27, 1)].style().fg, Some(Color::Indexed(22)));
        // 0 is the blank cell.
        assert_eq!(buf[(26, 1)].symbol(), " ");
    }

    #[test]
    fn time_ruler_follows_last_chart() {
        let buf = render(&dashboard(&[1.0]), 30, 6);
        let ruler = line(&buf, 2);
        assert!(ruler.starts_with("╚ "));
        assert!(ruler.contains("-0.00s|"));
    }

    #[test]
    fn tiny_area_does_not_panic() {
        let d = dashboard(&[1.0, 2.0, 3.0]);
        for (w, h) in [(0, 0), (1, 1), (3, 2), (5, 1)] {
            render(&d, w, h);
        }
    }

    #[test]
    fn offset_area_stays_inside() {
        let d = dashboard(&[10.0]);
        let full = Rect::new(0, 0, 40, 8);
        let inner = Rect::new(5, 2, 30, 4);
        let mut buf = Buffer::empty(full);
        let frame = d.layout(inner.width as usize, inner.height as usize);
        let palettes = Palettes::new(256);
        HorizonView::new(&frame, &palettes).render(inner, &mut buf);
        assert_eq!(buf[(0, 0)].symbol(), " ");
        assert_eq!(buf[(5, 2)].symbol(), "╔");
    }
}
