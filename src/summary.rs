use egui::{RichText, Ui};

/// What the info panel shows about the current selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
  pub title: String,
  /// Already filtered, never empty or "-".
  pub subtitle: Option<String>,
  pub count: usize,
}

/// The info panel about the current selection. Hidden while nothing is selected.
#[derive(Debug, Default)]
pub struct SummaryView {
  shown: Option<Summary>,
}

impl SummaryView {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  pub fn present(&mut self, title: &str, subtitle: Option<&str>, count: usize) {
    let subtitle = subtitle
      .filter(|s| !s.is_empty() && *s != "-")
      .map(str::to_string);
    self.shown = Some(Summary {
      title: title.to_string(),
      subtitle,
      count,
    });
  }

  pub fn dismiss(&mut self) {
    self.shown = None;
  }

  #[must_use]
  pub fn summary(&self) -> Option<&Summary> {
    self.shown.as_ref()
  }

  #[must_use]
  pub fn is_visible(&self) -> bool {
    self.shown.is_some()
  }

  pub fn ui(&self, ui: &mut Ui) {
    let Some(summary) = &self.shown else {
      return;
    };
    ui.heading(&summary.title);
    if let Some(subtitle) = &summary.subtitle {
      ui.label(RichText::new(subtitle).italics());
    }
    ui.label(format!("Locations: {}", summary.count));
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rstest::rstest;

  #[rstest]
  #[case(None)]
  #[case(Some(""))]
  #[case(Some("-"))]
  fn placeholder_subtitles_are_hidden(#[case] subtitle: Option<&str>) {
    let mut view = SummaryView::new();
    view.present("Exodus", subtitle, 2);
    assert_eq!(
      view.summary(),
      Some(&Summary {
        title: "Exodus".to_string(),
        subtitle: None,
        count: 2
      })
    );
  }

  #[rstest]
  #[case("AD 30-62")]
  #[case("  ")]
  #[case(" - ")]
  #[case(" c. 1446 BC ")]
  fn subtitle_is_shown_verbatim(#[case] subtitle: &str) {
    let mut view = SummaryView::new();
    view.present("Acts", Some(subtitle), 4);
    assert_eq!(
      view.summary().and_then(|s| s.subtitle.as_deref()),
      Some(subtitle)
    );
  }

  #[test]
  fn dismiss_hides_everything() {
    let mut view = SummaryView::new();
    view.present("Acts", Some("AD 30-62"), 4);
    view.dismiss();
    assert!(!view.is_visible());
    assert_eq!(view.summary(), None);
  }
}
