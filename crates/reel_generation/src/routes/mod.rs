//! One module per rendering style.

mod captioning;
mod general;
mod professional;
mod slides;
mod talking_head;
