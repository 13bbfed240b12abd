// View controllers: each owns its poll session and action machines outright.
// Rendering is plain text for the terminal; nothing here is shared between views.

pub mod dashboard;
pub mod detail;
pub mod upload;

#[cfg(test)]
mod fake_backend;

pub use dashboard::DashboardView;
pub use detail::DetailView;
pub use upload::UploadView;

/// Fixed-width text progress bar, e.g. `[#####---------------] 25%`.
pub fn progress_bar(percent: u8) -> String {
    const WIDTH: usize = 20;
    let percent = percent.min(100);
    let filled = usize::from(percent) * WIDTH / 100;
    format!(
        "[{}{}] {percent}%",
        "#".repeat(filled),
        "-".repeat(WIDTH - filled)
    )
}
