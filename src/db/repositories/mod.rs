mod fixations;

pub use fixations::FixationQuery;
