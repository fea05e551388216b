mod decoder;
mod document;
mod encoder;
mod iter;
mod writer;
