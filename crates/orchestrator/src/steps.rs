//! Workflow step names, used in logs and as metric labels.

/// Step name: fetch the product.
pub const GET_PRODUCT: &str = "get_product";

/// Step name: fetch the product's reviews.
pub const GET_REVIEWS: &str = "get_reviews";

/// Step name: fetch the product's recommendations.
pub const GET_RECOMMENDATIONS: &str = "get_recommendations";

/// Step name: create the product.
pub const CREATE_PRODUCT: &str = "create_product";

/// Step name: create the product's reviews.
pub const CREATE_REVIEWS: &str = "create_reviews";

/// Step name: create the product's recommendations.
pub const CREATE_RECOMMENDATIONS: &str = "create_recommendations";

/// Step name: delete the product.
pub const DELETE_PRODUCT: &str = "delete_product";

/// Step name: delete the product's reviews.
pub const DELETE_REVIEWS: &str = "delete_reviews";

/// Step name: delete the product's recommendations.
pub const DELETE_RECOMMENDATIONS: &str = "delete_recommendations";

/// Step name: publish the CREATE events of a composite product.
pub const PUBLISH_CREATES: &str = "publish_creates";
