/// Counter window selector for statistics reads and resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatWindow {
    Today,
    Month,
    AllTime,
}

impl StatWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatWindow::Today => "today",
            StatWindow::Month => "month",
            StatWindow::AllTime => "all_time",
        }
    }
}

impl std::fmt::Display for StatWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One leaderboard entry: a menu action name and its call count in the
/// requested window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionUsage {
    pub name: String,
    pub count: i32,
}
