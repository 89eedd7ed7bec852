/// Character cells in the progress bar, excluding the brackets.
pub const BAR_WIDTH: usize = 30;
pub const BAR_FILLED: char = '#';
pub const BAR_EMPTY: char = '-';
pub const DETAIL_INDENT: &str = "    ";
