//! # Diploma - Certificate Template Engine
//!
//! Diploma models two-sided course certificates and renders them. It provides:
//!
//! - **Template model**: positioned text fields on a front and back page,
//!   with legacy document normalization
//! - **Editor**: field add/remove/update, drag repositioning, hours-field
//!   reconciliation and background uploads, with change notifications
//! - **Renderer**: a pure page layout shared by previews and exports
//! - **Export**: atomic two-page PDF generation
//!
//! ## Quick Start
//!
//! ```
//! use diploma::{
//!     Config,
//!     binding::{Binding, BindingContext},
//!     render::{PageGeometry, RenderTarget, layout_page},
//!     template::{Page, default_template},
//! };
//!
//! let template = default_template();
//! let context = BindingContext {
//!     student_name: Some("Maria Elena Torres".to_string()),
//!     ..Default::default()
//! };
//! let config = Config::default();
//!
//! let layout = layout_page(
//!     &template,
//!     &Binding::bound(&context, &[]),
//!     Page::Front,
//!     RenderTarget::Screen { width: 800 },
//!     PageGeometry::for_background(&config, None),
//!     &config,
//! );
//!
//! let name = layout.item("studentName").unwrap();
//! assert_eq!(name.text, "Maria Elena Torres");
//! assert_eq!(name.center_x, 400.0);
//! assert_eq!(layout.item("studentDni").unwrap().text, "DNI: --------");
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`template`] | Template and field model, defaults, legacy loading |
//! | [`binding`] | Binding context and field value resolution |
//! | [`editor`] | Interactive editing state |
//! | [`render`] | Page layout and rasterization |
//! | [`export`] | Background loading and PDF export |
//! | [`server`] | HTTP service |
//! | [`config`] | Engine configuration |
//! | [`error`] | Error types |

pub mod binding;
pub mod config;
pub mod editor;
pub mod error;
pub mod export;
pub mod render;
pub mod server;
pub mod template;

// Re-exports for convenience
pub use config::Config;
pub use error::DiplomaError;
pub use template::Template;
