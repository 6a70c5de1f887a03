mod interaction;
mod paint;
mod view;
