//! Display State - what the UI should currently show
//!
//! This is NOT a widget tree. The Rendering Adapter paints it; nothing here
//! touches a rendering surface.

use facelens_core::ExpressionVariant;

use crate::{EmotionIcon, ExpressionModel};

/// Face box colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaceBoxTone {
    /// Gray, no face
    Neutral,
    /// Accent colour, face present
    Primary,
}

/// Face box around the camera preview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FaceBox {
    pub highlighted: bool,
}

impl FaceBox {
    pub const HIGHLIGHTED_STROKE: u32 = 8;
    pub const NEUTRAL_STROKE: u32 = 4;

    /// Tone shared by the box border and its caption
    pub fn tone(&self) -> FaceBoxTone {
        if self.highlighted {
            FaceBoxTone::Primary
        } else {
            FaceBoxTone::Neutral
        }
    }

    pub fn stroke_width(&self) -> u32 {
        if self.highlighted {
            Self::HIGHLIGHTED_STROKE
        } else {
            Self::NEUTRAL_STROKE
        }
    }
}

/// One expression model's panel
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExpressionPanel {
    pub model: ExpressionModel,
    pub visible: bool,
    /// Index into the model's icon table
    pub icon_index: Option<usize>,
    pub label: String,
}

impl ExpressionPanel {
    pub fn hidden(model: ExpressionModel) -> Self {
        Self {
            model,
            visible: false,
            icon_index: None,
            label: String::new(),
        }
    }

    pub fn icon(&self) -> Option<EmotionIcon> {
        self.icon_index.and_then(|index| self.model.icon(index))
    }
}

/// Head pose panel: `"x, y, z"` in whole degrees
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct HeadPosePanel {
    pub visible: bool,
    pub text: String,
}

/// Attention panel: `"O"` attending, `"X"` not, empty before the first reading
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct AttentionPanel {
    pub visible: bool,
    pub glyph: String,
}

impl AttentionPanel {
    pub const ATTENDING: &'static str = "O";
    pub const NOT_ATTENDING: &'static str = "X";

    pub fn glyph_for(is_attending: bool) -> &'static str {
        if is_attending {
            Self::ATTENDING
        } else {
            Self::NOT_ATTENDING
        }
    }
}

/// Complete display state of one session
///
/// Owned by whoever applies the reducer; renderers only ever see `&DisplayState`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DisplayState {
    pub face_box: FaceBox,
    /// Basic model panel, or the only panel of the single model
    pub basic: ExpressionPanel,
    /// Present only for the dual model
    pub valence: Option<ExpressionPanel>,
    pub head_pose: HeadPosePanel,
    pub attention: AttentionPanel,
}

impl DisplayState {
    /// Session-start state: every panel hidden, face box neutral
    pub fn initial(variant: ExpressionVariant) -> Self {
        Self {
            face_box: FaceBox::default(),
            basic: ExpressionPanel::hidden(ExpressionModel::Basic),
            valence: match variant {
                ExpressionVariant::Single => None,
                ExpressionVariant::Dual => Some(ExpressionPanel::hidden(ExpressionModel::Valence)),
            },
            head_pose: HeadPosePanel::default(),
            attention: AttentionPanel::default(),
        }
    }

    pub fn expression_variant(&self) -> ExpressionVariant {
        if self.valence.is_some() {
            ExpressionVariant::Dual
        } else {
            ExpressionVariant::Single
        }
    }

    pub fn expression_panels(&self) -> impl Iterator<Item = &ExpressionPanel> {
        std::iter::once(&self.basic).chain(self.valence.as_ref())
    }

    pub fn expression_panel(&self, model: ExpressionModel) -> Option<&ExpressionPanel> {
        match model {
            ExpressionModel::Basic => Some(&self.basic),
            ExpressionModel::Valence => self.valence.as_ref(),
        }
    }

    pub(crate) fn expression_panel_mut(
        &mut self,
        model: ExpressionModel,
    ) -> Option<&mut ExpressionPanel> {
        match model {
            ExpressionModel::Basic => Some(&mut self.basic),
            ExpressionModel::Valence => self.valence.as_mut(),
        }
    }

    /// Hide every panel; content is kept for the next reveal
    pub(crate) fn hide_panels(&mut self) {
        self.basic.visible = false;
        if let Some(valence) = self.valence.as_mut() {
            valence.visible = false;
        }
        self.head_pose.visible = false;
        self.attention.visible = false;
    }

    pub fn any_panel_visible(&self) -> bool {
        self.expression_panels().any(|p| p.visible)
            || self.head_pose.visible
            || self.attention.visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_dual() {
        let state = DisplayState::initial(ExpressionVariant::Dual);
        assert!(!state.face_box.highlighted);
        assert!(!state.any_panel_visible());
        assert_eq!(state.expression_panels().count(), 2);
        assert_eq!(state.expression_variant(), ExpressionVariant::Dual);
    }

    #[test]
    fn test_initial_state_single() {
        let state = DisplayState::initial(ExpressionVariant::Single);
        assert_eq!(state.expression_panels().count(), 1);
        assert!(state.expression_panel(ExpressionModel::Valence).is_none());
        assert_eq!(state.expression_variant(), ExpressionVariant::Single);
    }

    #[test]
    fn test_face_box_style() {
        let mut face_box = FaceBox::default();
        assert_eq!(face_box.tone(), FaceBoxTone::Neutral);
        assert_eq!(face_box.stroke_width(), 4);
        face_box.highlighted = true;
        assert_eq!(face_box.tone(), FaceBoxTone::Primary);
        assert_eq!(face_box.stroke_width(), 8);
    }

    #[test]
    fn test_panel_icon() {
        let mut panel = ExpressionPanel::hidden(ExpressionModel::Valence);
        assert_eq!(panel.icon(), None);
        panel.icon_index = Some(1);
        assert_eq!(panel.icon(), Some(EmotionIcon::Negative));
    }
}
