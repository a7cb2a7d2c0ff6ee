pub mod classifier_trait;
pub mod knn;
pub mod logistic;

pub use classifier_trait::ClassifierModel;
pub use knn::KNeighborsClassifier;
pub use logistic::LogisticRegressionModel;
