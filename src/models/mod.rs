pub mod resource;

pub use resource::{
    ListResourcesFilter, NewResource, Resource, ResourcePage, ResourcePatch, ResourceType,
};
