/// Geometry and typography of the interview sheet. Lengths in millimetres, font sizes in
/// points.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    pub page_width: f32,
    pub page_height: f32,
    /// Top and bottom margin; content never starts below `page_height - margin`.
    pub margin: f32,
    /// Wrap width for long-text fields.
    pub content_width: f32,
    pub left_column: f32,
    pub right_column: f32,
    /// Right end of rules and right-aligned text.
    pub right_edge: f32,
    /// Extra indent of list item details.
    pub item_indent: f32,

    pub title_size: f32,
    pub section_size: f32,
    pub subtitle_size: f32,
    pub body_size: f32,
    pub date_size: f32,
    pub footer_size: f32,

    pub rule_width: f32,
    /// Line pitch of wrapped long text.
    pub text_line_height: f32,
    /// Pitch of single-line fields.
    pub field_line_height: f32,

    pub footer_page_y: f32,
    pub footer_stamp_y: f32,

    pub tracking_columns: Vec<(String, f32)>,
    pub tracking_rows: usize,
    pub tracking_row_height: f32,
}

impl Default for LayoutConfig {
    /// A4 portrait with 20 mm margins.
    fn default() -> Self {
        LayoutConfig {
            page_width: 210.0,
            page_height: 297.0,
            margin: 20.0,
            content_width: 170.0,
            left_column: 20.0,
            right_column: 110.0,
            right_edge: 190.0,
            item_indent: 5.0,

            title_size: 24.0,
            section_size: 16.0,
            subtitle_size: 14.0,
            body_size: 12.0,
            date_size: 10.0,
            footer_size: 8.0,

            rule_width: 0.5,
            text_line_height: 6.0,
            field_line_height: 8.0,

            footer_page_y: 287.0,
            footer_stamp_y: 283.0,

            tracking_columns: vec![
                ("FECHA".to_string(), 30.0),
                ("ACTUACIÓN".to_string(), 80.0),
                ("OBSERVACIONES".to_string(), 60.0),
            ],
            tracking_rows: 15,
            tracking_row_height: 10.0,
        }
    }
}

impl LayoutConfig {
    /// Lowest y a block may reach.
    pub fn bottom_limit(&self) -> f32 {
        self.page_height - self.margin
    }

    pub fn center_x(&self) -> f32 {
        self.page_width / 2.0
    }
}
