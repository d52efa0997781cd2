//! Interfaces to the interactive side of tracking: clicks in, points out.

/// Colour of a plotted pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlotColor {
    Green,
    Red,
    Blue,
    White,
}

/// Receives the pixels accepted into a region when graphics are enabled.
pub trait DisplaySink {
    fn plot_point(&mut self, row: usize, col: usize, color: PlotColor);
}

/// Blocking source of user clicks, reported as `(row, col)`.
pub trait ClickSource {
    /// Wait for the next click. `None` when the source is closed.
    fn wait_for_click(&mut self) -> Option<(usize, usize)>;
}

/// Click source replaying a fixed sequence, for tests and unattended runs.
#[derive(Clone, Debug)]
pub struct ScriptedClicks<I>(pub I);

impl<I> ClickSource for ScriptedClicks<I>
where
    I: Iterator<Item = (usize, usize)>,
{
    fn wait_for_click(&mut self) -> Option<(usize, usize)> {
        self.0.next()
    }
}

/// Sink that drops every point; used when graphics are off.
pub(crate) struct NoDisplay;

impl DisplaySink for NoDisplay {
    fn plot_point(&mut self, _row: usize, _col: usize, _color: PlotColor) {}
}

impl DisplaySink for Vec<(usize, usize, PlotColor)> {
    fn plot_point(&mut self, row: usize, col: usize, color: PlotColor) {
        self.push((row, col, color));
    }
}
