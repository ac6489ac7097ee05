//! # Template Editor
//!
//! In-memory editing of a [`Template`] with change notifications.
//!
//! Every committed change sends a full normalized snapshot on the channel
//! returned by [`Editor::new`]. The host decides when to persist. Drag moves
//! repaint locally and are committed (and sent) once, on [`Editor::end_drag`].
//!
//! ```
//! use diploma::editor::{Editor, Point, Surface};
//! use diploma::template::default_template;
//!
//! let (mut editor, mut changes) = Editor::new(default_template());
//! editor.begin_drag("studentName", Point::new(100.0, 100.0), Surface::new(1000.0, 700.0)).unwrap();
//! editor.drag_move(Point::new(150.0, 100.0));
//! editor.drag_move(Point::new(200.0, 100.0));
//! editor.end_drag();
//!
//! let saved = changes.try_recv().unwrap();
//! assert_eq!(saved.field("studentName").unwrap().x, 60.0);
//! assert!(changes.try_recv().is_err());
//! ```

mod drag;
mod hours;
mod upload;

pub use drag::{DragState, Point, Surface, delta_to_percent, dragged_position, round_one_decimal};
pub use hours::{HoursMode, reconcile_hours};
pub use upload::{BackgroundUploader, LocalObjectStore, ObjectStore, validate_background};

use chrono::Utc;
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::error::DiplomaError;
use crate::template::defaults::metadata_field;
use crate::template::{CUSTOM_PREFIX, Field, Page, Template, clamp_percent, default_template};

/// Receiving end of template change notifications.
pub type TemplateChanges = mpsc::UnboundedReceiver<Template>;

/// Partial update for a field. Absent keys are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldPatch {
    pub label: Option<String>,
    pub page: Option<Page>,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub font_size: Option<f32>,
    pub color: Option<String>,
    pub font_family: Option<String>,
    pub visible: Option<bool>,
    pub value: Option<String>,
}

impl FieldPatch {
    pub fn position(x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Default::default()
        }
    }

    fn apply(self, field: &mut Field) {
        if let Some(label) = self.label {
            field.set_label(label);
        }
        if let Some(page) = self.page {
            field.page = page;
        }
        if let Some(x) = self.x {
            field.x = clamp_percent(x);
        }
        if let Some(y) = self.y {
            field.y = clamp_percent(y);
        }
        if let Some(size) = self.font_size.filter(|s| s.is_finite() && *s > 0.0) {
            field.font_size = size;
        }
        if let Some(color) = self.color {
            field.color = color;
        }
        if let Some(family) = self.font_family {
            field.font_family = family;
        }
        if let Some(visible) = self.visible {
            field.visible = visible;
        }
        if let Some(value) = self.value {
            field.value = Some(value);
        }
    }
}

/// Interactive editing state for one course's template.
pub struct Editor {
    template: Template,
    active_page: Page,
    selected: Option<String>,
    drag: DragState,
    hours_mode: Option<HoursMode>,
    changes: mpsc::UnboundedSender<Template>,
}

impl Editor {
    /// Start editing a template. The returned receiver gets one snapshot
    /// per committed change.
    pub fn new(template: Template) -> (Self, TemplateChanges) {
        let (tx, rx) = mpsc::unbounded_channel();
        let editor = Self {
            template: template.normalize(),
            active_page: Page::Front,
            selected: None,
            drag: DragState::Idle,
            hours_mode: None,
            changes: tx,
        };
        (editor, rx)
    }

    /// Open the editor for a course. A course without a template is seeded
    /// with the default layout, which is sent immediately so the host stores it.
    pub fn open(stored: Option<Template>) -> (Self, TemplateChanges) {
        match stored {
            Some(template) => Self::new(template),
            None => {
                let (editor, rx) = Self::new(default_template());
                editor.notify();
                (editor, rx)
            }
        }
    }

    fn notify(&self) {
        if self.changes.send(self.template.clone().normalize()).is_err() {
            tracing::debug!("template change dropped: no listener");
        }
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn into_template(self) -> Template {
        self.template.normalize()
    }

    /// Normalized snapshot for the host to persist with the course record.
    pub fn save(&self) -> Template {
        self.template.clone().normalize()
    }

    pub fn active_page(&self) -> Page {
        self.active_page
    }

    pub fn selected_field(&self) -> Option<&Field> {
        self.selected.as_deref().and_then(|id| self.template.field(id))
    }

    pub fn hours_mode(&self) -> Option<HoursMode> {
        self.hours_mode
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    /// Switch the editing surface. Selection is kept only if it is on the new page.
    pub fn select_page(&mut self, page: Page) {
        self.active_page = page;
        if self.selected_field().is_some_and(|f| f.page != page) {
            self.selected = None;
        }
    }

    /// Fields listed in the field panel: everything on the active page.
    pub fn fields_on_active_page(&self) -> impl Iterator<Item = &Field> {
        self.template.fields_on(self.active_page)
    }

    /// Fields shown on the surface as draggable.
    pub fn visible_fields(&self) -> impl Iterator<Item = &Field> {
        self.template.visible_fields_on(self.active_page)
    }

    pub fn select_field(&mut self, id: &str) -> Result<(), DiplomaError> {
        let field = self
            .template
            .field(id)
            .ok_or_else(|| DiplomaError::FieldNotFound(id.to_string()))?;
        self.active_page = field.page;
        self.selected = Some(id.to_string());
        Ok(())
    }

    fn generate_custom_id(&self) -> String {
        let base = format!("{}{}", CUSTOM_PREFIX, Utc::now().timestamp_millis());
        self.template.unique_id(&base)
    }

    /// Append a new custom field at the center of the active page and select it.
    pub fn add_field(&mut self) -> String {
        let id = self.generate_custom_id();
        let field = Field::new(id.clone(), "Nuevo campo", self.active_page)
            .with_value("Texto personalizado");
        self.template.fields.push(field);
        self.selected = Some(id.clone());
        self.notify();
        id
    }

    /// Append a prepared field. Its id must not already be in use.
    pub fn insert_field(&mut self, field: Field) -> Result<(), DiplomaError> {
        if self.template.contains_id(field.id()) {
            return Err(DiplomaError::DuplicateFieldId(field.id().to_string()));
        }
        self.selected = Some(field.id().to_string());
        self.template.fields.push(field);
        self.notify();
        Ok(())
    }

    /// Place a field bound to a metadata key on the active page.
    pub fn add_metadata_field(&mut self, key: &str) -> Result<String, DiplomaError> {
        if self.template.contains_label(key) {
            return Err(DiplomaError::DuplicateMetadataField(key.to_string()));
        }
        let mut field = metadata_field(key);
        field.page = self.active_page;
        let id = self.template.unique_id(field.id());
        self.insert_field(field.with_id(id.clone()))?;
        Ok(id)
    }

    pub fn remove_field(&mut self, id: &str) -> Result<Field, DiplomaError> {
        let index = self
            .template
            .fields
            .iter()
            .position(|f| f.id() == id)
            .ok_or_else(|| DiplomaError::FieldNotFound(id.to_string()))?;
        let removed = self.template.fields.remove(index);
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        if matches!(&self.drag, DragState::Dragging { field_id, .. } if field_id == id) {
            self.drag = DragState::Idle;
        }
        self.notify();
        Ok(removed)
    }

    pub fn update_field(&mut self, id: &str, patch: FieldPatch) -> Result<(), DiplomaError> {
        let field = self
            .template
            .field_mut(id)
            .ok_or_else(|| DiplomaError::FieldNotFound(id.to_string()))?;
        patch.apply(field);
        self.notify();
        Ok(())
    }

    /// Start dragging a visible field on the active page.
    pub fn begin_drag(
        &mut self,
        id: &str,
        pointer: Point,
        surface: Surface,
    ) -> Result<(), DiplomaError> {
        let field = self
            .template
            .visible_fields_on(self.active_page)
            .find(|f| f.id() == id)
            .ok_or_else(|| DiplomaError::FieldNotFound(id.to_string()))?;
        self.drag = DragState::Dragging {
            field_id: id.to_string(),
            origin: pointer,
            original: (field.x, field.y),
            surface,
        };
        self.selected = Some(id.to_string());
        Ok(())
    }

    /// Move the dragged field under the pointer. Returns its new position.
    /// Nothing is sent to the host until the drag ends.
    pub fn drag_move(&mut self, pointer: Point) -> Option<(f32, f32)> {
        let DragState::Dragging {
            field_id,
            origin,
            original,
            surface,
        } = &self.drag
        else {
            return None;
        };
        let (x, y) = dragged_position(*original, *origin, pointer, *surface);
        let field = self.template.field_mut(field_id)?;
        field.x = x;
        field.y = y;
        Some((x, y))
    }

    /// Commit the drag. Sends one snapshot if the field moved.
    pub fn end_drag(&mut self) -> bool {
        let DragState::Dragging {
            field_id, original, ..
        } = std::mem::take(&mut self.drag)
        else {
            return false;
        };
        let moved = self
            .template
            .field(&field_id)
            .is_some_and(|f| (f.x, f.y) != original);
        if moved {
            self.notify();
        }
        moved
    }

    /// Abort the drag and put the field back where it was.
    pub fn cancel_drag(&mut self) {
        if let DragState::Dragging {
            field_id, original, ..
        } = std::mem::take(&mut self.drag)
        {
            if let Some(field) = self.template.field_mut(&field_id) {
                field.x = original.0;
                field.y = original.1;
            }
        }
    }

    pub fn set_background(&mut self, page: Page, url: impl Into<String>) {
        self.template.set_background(page, url);
        self.notify();
    }

    /// Upload a background and assign it to `page`. On any failure the
    /// template is left untouched and the error names what went wrong.
    pub async fn upload_background(
        &mut self,
        uploader: &BackgroundUploader,
        page: Page,
        bytes: Vec<u8>,
    ) -> Result<String, DiplomaError> {
        let url = uploader.upload(page, bytes).await?;
        self.set_background(page, url.clone());
        Ok(url)
    }

    /// Reconcile the hours fields with a mode.
    pub fn set_hours_mode(&mut self, mode: HoursMode) {
        self.hours_mode = Some(mode);
        if reconcile_hours(&mut self.template, mode) {
            if self
                .selected
                .as_deref()
                .is_some_and(|id| !self.template.contains_id(id))
            {
                self.selected = None;
            }
            self.notify();
        }
    }
}
