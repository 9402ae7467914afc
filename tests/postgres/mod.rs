mod builder;
mod cache;
