use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, LegendPosition, Paragraph, Widget},
};

use crate::chart_data::ChartData;
use crate::config::Theme;

/// Theme keys for series colors, cycled when there are more genres than keys.
pub const SERIES_COLOR_KEYS: [&str; 7] = [
    "chart_series_color_1",
    "chart_series_color_2",
    "chart_series_color_3",
    "chart_series_color_4",
    "chart_series_color_5",
    "chart_series_color_6",
    "chart_series_color_7",
];

pub fn series_color(theme: &Theme, index: usize) -> Color {
    theme.get(SERIES_COLOR_KEYS[index % SERIES_COLOR_KEYS.len()])
}

/// Line chart of popularity per genre, years along x as categories.
pub struct GenreChart<'a> {
    data: &'a ChartData,
    theme: &'a Theme,
    show_legend: bool,
    focused: bool,
}

impl<'a> GenreChart<'a> {
    pub fn new(data: &'a ChartData, theme: &'a Theme) -> Self {
        Self {
            data,
            theme,
            show_legend: true,
            focused: false,
        }
    }

    pub fn show_legend(mut self, show: bool) -> Self {
        self.show_legend = show;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }
}

impl Widget for GenreChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let theme = self.theme;
        let border = if self.focused {
            theme.get("modal_border_active")
        } else {
            theme.get("modal_border")
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Popularity by year ")
            .border_style(Style::default().fg(border));
        let inner = block.inner(area);
        block.render(area, buf);

        let Some((x_min, x_max, y_min, y_max)) = self.data.bounds() else {
            Paragraph::new("No data to chart. Select genres in the sidebar.")
                .style(Style::default().fg(theme.get("text_secondary")))
                .centered()
                .render(inner, buf);
            return;
        };

        let datasets: Vec<Dataset> = self
            .data
            .series
            .iter()
            .enumerate()
            .filter(|(_, series)| !series.points.is_empty())
            .map(|(i, series)| {
                Dataset::default()
                    .name(series.genre.as_str())
                    .marker(symbols::Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(Style::default().fg(series_color(theme, i)))
                    .data(&series.points)
            })
            .collect();

        let (x_lo, x_hi) = if x_max > x_min {
            (x_min, x_max)
        } else {
            (x_min - 0.5, x_min + 0.5)
        };
        let y_hi = if y_max > y_min { y_max } else { y_min + 1.0 };

        let label_style = Style::default().fg(theme.get("text_primary"));
        let x_labels: Vec<Span> = category_ticks(self.data, inner.width)
            .into_iter()
            .map(|label| Span::styled(label, label_style))
            .collect();
        let y_labels = vec![
            Span::styled(format_axis_label(y_min), label_style),
            Span::styled(format_axis_label((y_min + y_hi) / 2.0), label_style),
            Span::styled(format_axis_label(y_hi), label_style),
        ];

        let axis_style = Style::default().fg(theme.get("text_primary"));
        let chart = Chart::new(datasets)
            .x_axis(
                Axis::default()
                    .title("year")
                    .bounds([x_lo, x_hi])
                    .style(axis_style)
                    .labels(x_labels),
            )
            .y_axis(
                Axis::default()
                    .title("popularity")
                    .bounds([y_min, y_hi])
                    .style(axis_style)
                    .labels(y_labels),
            )
            .legend_position(self.show_legend.then_some(LegendPosition::TopRight));
        chart.render(inner, buf);
    }
}

/// Evenly spaced x labels. Axis labels are spread over the full width, so with
/// few categories every one is shown; otherwise first, middle and last.
fn category_ticks(data: &ChartData, width: u16) -> Vec<String> {
    let n = data.categories.len();
    let fits = data
        .categories
        .iter()
        .map(|c| c.chars().count() + 1)
        .sum::<usize>()
        <= width as usize / 2;
    if n <= 1 || fits {
        return data.categories.clone();
    }
    let middle = if n % 2 == 1 {
        data.categories[n / 2].clone()
    } else {
        String::new()
    };
    vec![data.categories[0].clone(), middle, data.categories[n - 1].clone()]
}

pub fn format_axis_label(v: f64) -> String {
    if v.abs() >= 1e6 || (v.abs() < 1e-2 && v != 0.0) {
        format!("{:.2e}", v)
    } else {
        format!("{:.2}", v)
    }
}
