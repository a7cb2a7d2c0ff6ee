use crate::config::MethodType;
use crate::error::Result;
use crate::methods::{ClassifierMethod, Method, SimilarityMethod};

/// Build a scoring method from its configuration, resolving `Auto` against
/// the number of positive samples available.
pub fn build_method(method_type: &MethodType, n_positive: usize) -> Method {
    match method_type.resolve(n_positive) {
        MethodType::Similarity { metric } => Method::Similarity(SimilarityMethod::new(metric)),
        MethodType::Classifier {
            n_neighbors,
            negative_ratio,
            min_negative_distance,
            seed,
        } => Method::Classifier(ClassifierMethod::new(
            n_neighbors,
            negative_ratio,
            min_negative_distance,
            seed,
        )),
        // `resolve` never returns Auto
        MethodType::Auto => Method::Similarity(SimilarityMethod::new(Default::default())),
    }
}

/// Look a method up by name (`auto`, `similarity` or `classifier`) with default parameters.
pub fn get_method(name: &str, n_positive: usize) -> Result<Method> {
    let method_type: MethodType = name.parse()?;
    Ok(build_method(&method_type, n_positive))
}
