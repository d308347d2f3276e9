mod builder;
mod mp4;
