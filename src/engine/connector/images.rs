//! Image listing, inspection, removal and tagging.

use hyper::Method;

use super::{DockerConnector, image_segment};
use super::classify::{Accept, expect_status};
use crate::engine::models::{ImageDeleteResponseItem, ImageInspect, ImageSummary};
use crate::engine::params::{
    InspectImageParams, ListImagesParams, OperationParams, RemoveImageParams, TagImageParams,
};
use crate::error::EngineError;

impl DockerConnector {
    /// List images (`GET /images/json`).
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Daemon` for a non-200 status, a transport error
    /// if the daemon cannot be reached, or `EngineError::Parse` for an
    /// unexpected body.
    pub async fn list_images(
        &self,
        params: &ListImagesParams,
    ) -> Result<Vec<ImageSummary>, EngineError> {
        let response = self
            .prepare(params)?
            .path(&self.path("/images/json"))
            .query_if_set("all", params.all)
            .request()
            .await?;
        expect_status(response, ListImagesParams::OPERATION, Accept::Only(&[200]))
            .await?
            .json()
            .await
    }

    /// Inspect one image (`GET /images/{image}/json`).
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidArgument` for a blank image name,
    /// otherwise as for [`Self::list_images`].
    pub async fn inspect_image(
        &self,
        params: &InspectImageParams,
    ) -> Result<ImageInspect, EngineError> {
        let response = self
            .prepare(params)?
            .path(&self.path(&format!("/images/{}/json", image_segment(&params.image))))
            .request()
            .await?;
        expect_status(response, InspectImageParams::OPERATION, Accept::Only(&[200]))
            .await?
            .json()
            .await
    }

    /// Remove an image (`DELETE /images/{image}`).
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidArgument` for a blank image name,
    /// otherwise as for [`Self::list_images`].
    pub async fn remove_image(
        &self,
        params: &RemoveImageParams,
    ) -> Result<Vec<ImageDeleteResponseItem>, EngineError> {
        let response = self
            .prepare(params)?
            .method(Method::DELETE)
            .path(&self.path(&format!("/images/{}", image_segment(&params.image))))
            .query_if_set("force", params.force)
            .query_if_set("noprune", params.no_prune)
            .request()
            .await?;
        expect_status(response, RemoveImageParams::OPERATION, Accept::Only(&[200]))
            .await?
            .json()
            .await
    }

    /// Add a repository name and tag to an image (`POST /images/{image}/tag`).
    ///
    /// Any 2xx status counts as success.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidArgument` for a blank image or
    /// repository, `EngineError::Daemon` for a non-2xx status, or a transport
    /// error.
    pub async fn tag_image(&self, params: &TagImageParams) -> Result<(), EngineError> {
        let response = self
            .prepare(params)?
            .method(Method::POST)
            .path(&self.path(&format!("/images/{}/tag", image_segment(&params.image))))
            .query("repo", &params.repository)
            .query_if_set("tag", params.tag.as_ref())
            .query_if_set("force", params.force)
            .request()
            .await?;
        expect_status(response, TagImageParams::OPERATION, Accept::AnySuccess).await?;
        Ok(())
    }
}
