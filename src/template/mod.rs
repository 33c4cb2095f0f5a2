//! Component templates
//!
//! Templates are registered under custom element names. Rendering an
//! element with a registered name expands a fresh copy of the template in
//! its place, routing the element's content into the template's slots.
//!
//! ```text
//! <!-- my-card -->
//! <article>
//!   <h2><ssr-slot name="title">Untitled</ssr-slot></h2>
//!   <ssr-slot></ssr-slot>
//! </article>
//!
//! <!-- usage -->
//! <my-card>
//!   <ssr-fragment slot="title">Hello</ssr-fragment>
//!   <p>Body</p>
//! </my-card>
//! ```

mod registry;
mod resolver;

pub use registry::{TemplateError, TemplateRegistry};
pub use resolver::{expand, Expansion, ResolutionContext, DEFAULT_SLOT};
