use std::io::{self, Write};

use cloudtrace_core::{format_elapsed, AlertTone, AppViewModel, Phase, ProgressView};

use super::constants::*;

/// Builds the dashboard frame for a view, one string per terminal line.
pub fn render(view: &AppViewModel, link_base: &str) -> Vec<String> {
    let mut lines = Vec::new();

    if let Some(alert) = &view.alert {
        lines.push(format!("{} {}", tone_tag(alert.tone), alert.title));
        lines.push(format!("{DETAIL_INDENT}{}", alert.body));
    }

    if view.progress_visible {
        if let Some(progress) = &view.progress {
            lines.push(format_progress(progress));
            if !progress.details.is_empty() {
                lines.push(format!("{DETAIL_INDENT}{}", progress.details));
            }
            // The completion details drop the running clock.
            if let (Phase::Complete, Some(secs)) = (view.phase, progress.elapsed_secs) {
                lines.push(format!("{DETAIL_INDENT}Total time: {}", format_elapsed(secs)));
            }
        }
    }

    if let Some(link) = results_link(view, link_base) {
        lines.push(format!("{DETAIL_INDENT}View Results: {link}"));
    }

    if let Some(notice) = &view.notice {
        lines.push(format!("! {notice}"));
    }

    lines.push(format!(
        "Status: {} | {} ({})",
        phase_label(view.phase),
        view.submit.label,
        if view.submit.enabled {
            "enabled"
        } else {
            "disabled"
        }
    ));

    lines
}

fn format_progress(progress: &ProgressView) -> String {
    format!(
        "{} {:>3}%  {}",
        progress_bar(progress.percent),
        progress.percent.round(),
        progress.status_text
    )
}

pub fn progress_bar(percent: f64) -> String {
    let ratio = percent.clamp(0.0, 100.0) / 100.0;
    let filled = ((ratio * BAR_WIDTH as f64).round() as usize).min(BAR_WIDTH);
    let mut bar = String::with_capacity(BAR_WIDTH + 2);
    bar.push('[');
    bar.extend(std::iter::repeat(BAR_FILLED).take(filled));
    bar.extend(std::iter::repeat(BAR_EMPTY).take(BAR_WIDTH - filled));
    bar.push(']');
    bar
}

fn results_link(view: &AppViewModel, link_base: &str) -> Option<String> {
    if !view.success_visible {
        return None;
    }
    let link = view.alert.as_ref()?.link.as_deref()?;
    Some(format!("{}{}", link_base.trim_end_matches('/'), link))
}

fn tone_tag(tone: AlertTone) -> &'static str {
    match tone {
        AlertTone::Info => "[info]",
        AlertTone::Success => "[done]",
        AlertTone::Danger => "[error]",
    }
}

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "Idle",
        Phase::Starting => "Starting",
        Phase::Running => "Running",
        Phase::Complete => "Complete",
        Phase::Error => "Error",
    }
}

/// Whether frames may overwrite each other in place.
///
/// The terminal logger writes to stderr between frames; when that lands on
/// the same screen the cursor arithmetic breaks, so frames are appended.
pub fn redraw_in_place(stdout_is_terminal: bool, stderr_is_terminal: bool) -> bool {
    stdout_is_terminal && !stderr_is_terminal
}

/// Writes frames to a terminal or plain stream, skipping unchanged ones.
pub struct TerminalRenderer<W: Write> {
    out: W,
    link_base: String,
    last: Vec<String>,
    /// Overwrite the previous frame with ANSI cursor movement.
    in_place: bool,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W, link_base: impl Into<String>, in_place: bool) -> Self {
        Self {
            out,
            link_base: link_base.into(),
            last: Vec::new(),
            in_place,
        }
    }

    pub fn draw(&mut self, view: &AppViewModel) -> io::Result<()> {
        let frame = render(view, &self.link_base);
        if frame == self.last {
            return Ok(());
        }

        if self.in_place && !self.last.is_empty() {
            // Cursor up over the old frame, then clear to the end of screen.
            write!(self.out, "\x1b[{}A\x1b[J", self.last.len())?;
        }
        for line in &frame {
            writeln!(self.out, "{line}")?;
        }
        self.out.flush()?;
        self.last = frame;
        Ok(())
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudtrace_core::{AlertView, SubmitView, RESULTS_LINK, SUBMIT_LABEL};
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    /// Screen shared by the renderer and a stand-in for the stderr logger.
    #[derive(Clone, Default)]
    struct SharedScreen(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedScreen {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedScreen {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn complete_view() -> AppViewModel {
        AppViewModel {
            phase: Phase::Complete,
            progress_visible: true,
            progress: Some(ProgressView {
                percent: 100.0,
                status_text: "Complete (100%)".into(),
                details: "Benchmark complete! Results ready to view.".into(),
                elapsed_secs: Some(125),
            }),
            alert: Some(AlertView {
                tone: AlertTone::Success,
                title: "Benchmark Complete!".into(),
                body: "The benchmark has completed successfully.".into(),
                link: Some(RESULTS_LINK.into()),
            }),
            success_visible: true,
            submit: SubmitView {
                enabled: true,
                label: SUBMIT_LABEL,
            },
            notice: None,
        }
    }

    #[test]
    fn bar_fill_tracks_percent() {
        assert_eq!(progress_bar(0.0), format!("[{}]", "-".repeat(BAR_WIDTH)));
        assert_eq!(progress_bar(100.0), format!("[{}]", "#".repeat(BAR_WIDTH)));
        let half = progress_bar(50.0);
        assert_eq!(half.matches('#').count(), BAR_WIDTH / 2);
        assert_eq!(progress_bar(150.0), progress_bar(100.0));
    }

    #[test]
    fn completed_frame() {
        let frame = render(&complete_view(), "http://127.0.0.1:5000/");
        assert_eq!(
            frame,
            vec![
                "[done] Benchmark Complete!".to_string(),
                "    The benchmark has completed successfully.".to_string(),
                format!("[{}] 100%  Complete (100%)", "#".repeat(BAR_WIDTH)),
                "    Benchmark complete! Results ready to view.".to_string(),
                "    Total time: 2m 5s".to_string(),
                "    View Results: http://127.0.0.1:5000/visualize".to_string(),
                "Status: Complete | Start Benchmark (enabled)".to_string(),
            ]
        );
    }

    #[test]
    fn idle_frame_with_notice() {
        let view = AppViewModel {
            notice: Some("Please select at least one cloud provider".into()),
            ..AppViewModel::default()
        };
        assert_eq!(
            render(&view, "http://localhost:5000"),
            vec![
                "! Please select at least one cloud provider".to_string(),
                "Status: Idle | Start Benchmark (enabled)".to_string(),
            ]
        );
    }

    #[test]
    fn unchanged_frames_are_not_rewritten() {
        let mut renderer = TerminalRenderer::new(Vec::new(), "http://localhost:5000", false);
        let view = complete_view();
        renderer.draw(&view).unwrap();
        renderer.draw(&view).unwrap();

        let output = String::from_utf8(renderer.into_inner()).unwrap();
        assert_eq!(output.matches("Benchmark Complete!").count(), 1);
    }

    #[test]
    fn results_link_needs_success() {
        let view = AppViewModel {
            success_visible: false,
            ..complete_view()
        };
        let frame = render(&view, "http://localhost:5000");
        assert!(frame.iter().all(|line| !line.contains("View Results")));
    }

    #[test]
    fn in_place_only_when_stderr_is_elsewhere() {
        assert!(redraw_in_place(true, false));
        assert!(!redraw_in_place(true, true));
        assert!(!redraw_in_place(false, false));
    }

    #[test]
    fn log_line_between_frames_keeps_both_frames() {
        let screen = SharedScreen::default();
        let mut log = screen.clone();
        let mut renderer = TerminalRenderer::new(
            screen.clone(),
            "http://localhost:5000",
            redraw_in_place(true, true),
        );

        let running = AppViewModel {
            phase: Phase::Running,
            progress_visible: true,
            progress: Some(ProgressView {
                percent: 40.0,
                status_text: "aws (40%)".into(),
                details: "Processing: aws".into(),
                elapsed_secs: None,
            }),
            ..AppViewModel::default()
        };
        renderer.draw(&running).unwrap();
        writeln!(log, "[INFO] Benchmark reached a terminal state; polling stopped").unwrap();
        renderer.draw(&complete_view()).unwrap();

        let contents = screen.contents();
        assert!(!contents.contains('\x1b'));
        let mut expected = render(&running, "http://localhost:5000");
        expected.push("[INFO] Benchmark reached a terminal state; polling stopped".to_string());
        expected.extend(render(&complete_view(), "http://localhost:5000"));
        let lines: Vec<String> = contents.lines().map(str::to_string).collect();
        assert_eq!(lines, expected);
    }
}
