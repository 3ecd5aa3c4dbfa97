mod references;
mod registry;
mod support;
