//! Project codes

use super::model;
use crate::mixins::Metadata;

model! {
    /// Project code used to tag orders and builds
    ProjectCode(ProjectCodeModel) => "project-code/", min_api = 109
}

impl Metadata for ProjectCodeModel {}

impl ProjectCode {
    /// The code itself
    pub fn code(&self) -> Option<&str> {
        self.str_field("code")
    }

    pub fn description(&self) -> Option<&str> {
        self.str_field("description")
    }
}
