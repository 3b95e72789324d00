// ============================================================================
// PAINT APP - gesture state machine driven by discrete input events
// ============================================================================

use std::path::Path;

use crate::canvas::{Color, PixelBuffer};
use crate::components::history::HistoryManager;
use crate::components::text_tool::TextOverlay;
use crate::components::tools::{PointerButton, StrokeRenderer, Tool, ToolState};
use crate::error::{PaintError, PaintResult};
use crate::io::{self, SaveFormat};
use crate::ops::compositor::Compositor;
use crate::ops::fill::{FillOutcome, flood_fill};
use crate::ops::shapes::CapStyle;
use crate::ops::text::{FontLibrary, GlyphSource, TextAnchor, draw_text_line};
use crate::project::Project;
use crate::settings::Settings;
use crate::{log_info, log_warn};

/// Keyboard actions the engine reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    Undo,
    /// Bake the open text overlay.
    CommitText,
    Char(char),
    Newline,
    Backspace,
    /// Abandon the open gesture or text overlay.
    Cancel,
}

/// Surface-local input, in canvas pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    PointerDown { x: i32, y: i32, button: PointerButton },
    PointerMove { x: i32, y: i32 },
    PointerUp { x: i32, y: i32 },
    Key(KeyAction),
}

/// Public view of the gesture state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GesturePhase {
    Idle,
    Drawing,
    EditingText,
}

enum GestureState {
    Idle,
    Drawing,
    EditingText(TextOverlay),
}

/// One canvas plus everything needed to paint on it.
pub struct PaintApp {
    project: Project,
    tools: ToolState,
    renderer: StrokeRenderer,
    compositor: Compositor,
    fonts: FontLibrary,
    /// Forces a glyph source instead of resolving fonts by family.
    glyph_override: Option<GlyphSource>,
    state: GestureState,
    status: String,
}

impl PaintApp {
    /// Blank canvas with default tools, filled with the background colour.
    pub fn new(width: u32, height: u32) -> PaintResult<Self> {
        Self::with_tools(width, height, ToolState::default(), FontLibrary::new(FontLibrary::default_dirs()))
    }

    pub fn from_settings(settings: &Settings) -> PaintResult<Self> {
        Self::with_tools(
            settings.canvas_width,
            settings.canvas_height,
            settings.tool_state(),
            settings.font_library(),
        )
    }

    pub fn with_tools(width: u32, height: u32, tools: ToolState, fonts: FontLibrary) -> PaintResult<Self> {
        let project = Project::new_untitled(1, width, height, tools.background)?;
        let renderer = StrokeRenderer::new(width, height)?;
        log_info!("New canvas {}x{} ({})", width, height, project.id);
        Ok(Self {
            project,
            tools,
            renderer,
            compositor: Compositor::new(),
            fonts,
            glyph_override: None,
            state: GestureState::Idle,
            status: String::new(),
        })
    }

    // ---- accessors ----------------------------------------------------------

    /// The canonical surface (never shows uncommitted previews).
    pub fn canvas(&self) -> &PixelBuffer {
        &self.project.canvas
    }

    /// What the user sees: the live preview while a gesture or text overlay
    /// is open, the canonical surface otherwise.
    pub fn display_frame(&self) -> &PixelBuffer {
        self.compositor.frame().unwrap_or(&self.project.canvas)
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn history(&self) -> &HistoryManager {
        &self.project.history
    }

    pub fn tool_state(&self) -> &ToolState {
        &self.tools
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn phase(&self) -> GesturePhase {
        match self.state {
            GestureState::Idle => GesturePhase::Idle,
            GestureState::Drawing => GesturePhase::Drawing,
            GestureState::EditingText(_) => GesturePhase::EditingText,
        }
    }

    pub fn text_overlay(&self) -> Option<&TextOverlay> {
        match &self.state {
            GestureState::EditingText(overlay) => Some(overlay),
            _ => None,
        }
    }

    /// Use `source` for text and stamps instead of font lookup.  `None`
    /// restores lookup through the font library.
    pub fn set_glyph_source(&mut self, source: Option<GlyphSource>) {
        self.glyph_override = source;
        self.refresh_preview();
    }

    // ---- tool state ---------------------------------------------------------

    /// Switching tools finalizes whatever is open.
    pub fn set_tool(&mut self, tool: Tool) {
        if self.tools.tool == tool {
            return;
        }
        self.finalize_pending();
        self.tools.tool = tool;
        self.status = format!("Tool: {}", tool.label());
        log_info!("{}", self.status);
    }

    pub fn set_brush_size(&mut self, size: u32) {
        self.tools.set_size(size);
        self.status = format!("Brush thickness set to: {}px", self.tools.size);
        self.refresh_preview();
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.tools.set_opacity(opacity);
        self.refresh_preview();
    }

    pub fn set_foreground(&mut self, color: Color) {
        self.tools.foreground = color;
        self.refresh_preview();
    }

    pub fn set_background(&mut self, color: Color) {
        self.tools.background = color;
        self.refresh_preview();
    }

    pub fn set_font_family(&mut self, family: &str) {
        self.tools.font_family = family.to_string();
        self.refresh_preview();
    }

    pub fn set_bold(&mut self, bold: bool) {
        self.tools.bold = bold;
        self.refresh_preview();
    }

    pub fn set_italic(&mut self, italic: bool) {
        self.tools.italic = italic;
        self.refresh_preview();
    }

    pub fn set_line_cap(&mut self, cap: CapStyle) {
        self.tools.line_cap = cap;
    }

    pub fn set_stamp_glyph(&mut self, glyph: char) {
        self.tools.stamp_glyph = glyph;
    }

    // ---- input --------------------------------------------------------------

    pub fn handle(&mut self, event: InputEvent) {
        match event {
            InputEvent::PointerDown { x, y, button } => self.pointer_down(x, y, button),
            InputEvent::PointerMove { x, y } => self.pointer_move(x, y),
            InputEvent::PointerUp { x, y } => self.pointer_up(x, y),
            InputEvent::Key(action) => self.key(action),
        }
    }

    pub fn pointer_down(&mut self, x: i32, y: i32, button: PointerButton) {
        let font_size = self.tools.size as f32;
        if let GestureState::EditingText(overlay) = &mut self.state {
            if overlay.contains(x, y, font_size) {
                overlay.begin_drag(x, y);
                return;
            }
            // Clicking outside the overlay commits it and consumes the click.
            self.commit_text();
            return;
        }
        if matches!(self.state, GestureState::Drawing) {
            self.finish_gesture();
        }

        let color = self.tools.color_for(button);
        match self.tools.tool {
            Tool::Fill => self.fill_at(x, y, color),
            Tool::Stamp => self.stamp_at(x, y, color),
            Tool::Text => {
                self.state = GestureState::EditingText(TextOverlay::new((x, y), button));
                self.status = "Text: type, then commit".to_string();
                self.refresh_preview();
            }
            tool => {
                if self.renderer.begin(tool, (x, y), color, self.tools.size, self.tools.line_cap) {
                    log_info!("{} gesture started at ({}, {})", tool.label(), x, y);
                    self.state = GestureState::Drawing;
                    self.refresh_preview();
                }
            }
        }
    }

    pub fn pointer_move(&mut self, x: i32, y: i32) {
        if let GestureState::EditingText(overlay) = &mut self.state {
            if overlay.drag_to(x, y) {
                self.refresh_preview();
            }
            return;
        }
        if matches!(self.state, GestureState::Drawing) {
            self.renderer.extend((x, y));
            self.refresh_preview();
        }
    }

    pub fn pointer_up(&mut self, x: i32, y: i32) {
        if let GestureState::EditingText(overlay) = &mut self.state {
            overlay.end_drag();
            return;
        }
        if matches!(self.state, GestureState::Drawing) {
            self.renderer.extend((x, y));
            self.finish_gesture();
        }
    }

    pub fn key(&mut self, action: KeyAction) {
        match action {
            KeyAction::Undo => {
                self.undo();
            }
            KeyAction::CommitText => self.commit_text(),
            KeyAction::Cancel => match self.state {
                GestureState::EditingText(_) => self.discard_text(),
                GestureState::Drawing => self.cancel_gesture(),
                GestureState::Idle => {}
            },
            KeyAction::Char(_) | KeyAction::Newline | KeyAction::Backspace => {
                let GestureState::EditingText(overlay) = &mut self.state else {
                    return;
                };
                match action {
                    KeyAction::Char(ch) => overlay.insert_char(ch),
                    KeyAction::Newline => overlay.newline(),
                    _ => overlay.backspace(),
                }
                self.refresh_preview();
            }
        }
    }

    // ---- actions ------------------------------------------------------------

    /// Restore the state before the most recent action.  An open gesture
    /// or text overlay is finalized first.  Returns `false` when there was
    /// nothing to undo.
    pub fn undo(&mut self) -> bool {
        self.finalize_pending();
        match self.project.history.undo(&mut self.project.canvas) {
            Some(description) => {
                self.project.mark_dirty();
                self.compositor.invalidate();
                self.status = format!("Undo: {}", description);
                log_info!("{}", self.status);
                true
            }
            None => {
                self.status = PaintError::EmptyHistory.to_string();
                false
            }
        }
    }

    /// Fill the whole canvas with the background colour.
    pub fn clear(&mut self) {
        self.finalize_pending();
        self.project.begin_edit("Clear");
        self.project.canvas.fill(self.tools.background);
        self.compositor.invalidate();
        self.status = "Canvas cleared".to_string();
    }

    /// Bake any open stroke or text overlay into the canvas.
    pub fn finalize_pending(&mut self) {
        match self.state {
            GestureState::Idle => {}
            GestureState::Drawing => self.finish_gesture(),
            GestureState::EditingText(_) => self.commit_text(),
        }
    }

    /// Finalize pending work and write the canvas to `path`.
    pub fn export(&mut self, path: &Path, format: SaveFormat, quality: u8) -> PaintResult<()> {
        self.finalize_pending();
        io::export_canvas(&self.project.canvas, path, format, quality)?;
        self.project.mark_saved(path.to_path_buf());
        log_info!("Exported {} to {}", self.project.name, path.display());
        Ok(())
    }

    fn fill_at(&mut self, x: i32, y: i32, color: Color) {
        match self.project.canvas.get(x, y) {
            Err(_) => return,
            Ok(current) if current == color => {
                log_info!("Fill at ({}, {}) is a no-op: region already has that colour", x, y);
                self.status = "Area already filled".to_string();
                return;
            }
            Ok(_) => {}
        }
        self.project.begin_edit("Fill");
        if let FillOutcome::Filled { pixels, .. } = flood_fill(&mut self.project.canvas, x, y, color) {
            log_info!("Filled {} pixels from ({}, {})", pixels, x, y);
        }
        self.compositor.invalidate();
    }

    fn stamp_at(&mut self, x: i32, y: i32, color: Color) {
        let source = self.glyph_source();
        let style = self.tools.stamp_style(color);
        let size = self.tools.size as f32;
        let glyph = self.tools.stamp_glyph.to_string();

        let scratch = self.renderer.scratch_mut();
        scratch.clear();
        // Glyph is centred-ish on the click: shifted left by half its width
        // and down to its baseline.
        let painted = draw_text_line(
            scratch,
            &source,
            &glyph,
            x as f32 - size * 2.0,
            y as f32 + size * 1.5,
            TextAnchor::Baseline,
            &style,
        );
        if painted.is_empty() {
            return;
        }
        self.project.begin_edit("Stamp");
        self.compositor
            .bake(&mut self.project.canvas, self.renderer.scratch_mut(), self.tools.opacity);
    }

    fn finish_gesture(&mut self) {
        if !matches!(self.state, GestureState::Drawing) {
            return;
        }
        self.state = GestureState::Idle;
        match self.renderer.end() {
            Some(delta) if !delta.bounds.is_empty() => {
                // The canvas is untouched until the bake, so this is the
                // pre-gesture state.
                self.project.begin_edit(delta.tool.label());
                self.compositor
                    .bake(&mut self.project.canvas, self.renderer.scratch_mut(), self.tools.opacity);
                let points = delta.stroke.map(|s| s.points.len()).unwrap_or(2);
                log_info!("{} stroke baked ({} points)", delta.tool.label(), points);
            }
            _ => {
                self.renderer.cancel();
                self.compositor.invalidate();
            }
        }
    }

    fn cancel_gesture(&mut self) {
        if !matches!(self.state, GestureState::Drawing) {
            return;
        }
        self.state = GestureState::Idle;
        self.renderer.cancel();
        self.compositor.invalidate();
        self.status = "Stroke cancelled".to_string();
    }

    fn commit_text(&mut self) {
        if !matches!(self.state, GestureState::EditingText(_)) {
            return;
        }
        let source = self.glyph_source();
        let GestureState::EditingText(overlay) = std::mem::replace(&mut self.state, GestureState::Idle) else {
            return;
        };
        self.renderer.cancel();
        self.compositor.invalidate();
        if overlay.is_empty() {
            self.status = "Nothing to commit".to_string();
            return;
        }

        let style = self.tools.text_style(self.tools.color_for(overlay.button));
        overlay.render(self.renderer.scratch_mut(), &source, &style);
        self.project.begin_edit("Text");
        self.compositor
            .bake(&mut self.project.canvas, self.renderer.scratch_mut(), self.tools.opacity);
        self.status = "Text committed".to_string();
        log_info!("Committed {} line(s) of text at {:?}", overlay.lines().count(), overlay.anchor);
    }

    fn discard_text(&mut self) {
        if let GestureState::EditingText(_) = std::mem::replace(&mut self.state, GestureState::Idle) {
            self.renderer.cancel();
            self.compositor.invalidate();
            self.status = "Text discarded".to_string();
        }
    }

    fn glyph_source(&mut self) -> GlyphSource {
        if let Some(source) = &self.glyph_override {
            return source.clone();
        }
        self.fonts
            .resolve(&self.tools.font_family, self.tools.bold, self.tools.italic)
    }

    /// Recompose the displayed frame after anything the preview depends on
    /// changed.
    fn refresh_preview(&mut self) {
        match self.state {
            GestureState::Idle => {
                self.compositor.invalidate();
                return;
            }
            GestureState::Drawing => {}
            GestureState::EditingText(_) => {
                let source = self.glyph_source();
                if let GestureState::EditingText(overlay) = &self.state {
                    let style = self.tools.text_style(self.tools.color_for(overlay.button));
                    let scratch = self.renderer.scratch_mut();
                    scratch.clear();
                    let painted = overlay.render(scratch, &source, &style);
                    if painted.is_empty() && !overlay.is_empty() {
                        log_warn!("Text overlay at {:?} is entirely off-canvas", overlay.anchor);
                    }
                }
            }
        }
        self.compositor
            .compose_frame(&self.project.canvas, self.renderer.preview_frame(), self.tools.opacity);
    }
}
