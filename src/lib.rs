//! Region selection and text fitting for image annotation.
//!
//! Selections are bit-packed [`canvas::PixelMask`]s built by the tools in
//! [`components::tools`], merged and replayed by [`components::layers`], and
//! handed to [`ops::text::typeset`] to fit text inside them.

pub mod canvas;
pub mod cli;
pub mod components;
pub mod io;
pub mod logger;
pub mod ops;
pub mod project;
pub mod settings;
