mod controls;
mod details;
mod fps;
mod graph;
mod panels;
