mod helpers;
mod newsletters;
mod send;
