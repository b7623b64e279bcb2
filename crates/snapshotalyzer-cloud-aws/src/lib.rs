//! EC2 binding for Snapshotalyzer
//!
//! Implements `ResourceClient` on top of `aws-sdk-ec2`, using the shared
//! AWS config/credentials files for authentication.
//!
//! # Example
//!
//! ```ignore
//! use snapshotalyzer_cloud::{ResourceClient, InstanceFilter};
//! use snapshotalyzer_cloud_aws::{AwsOptions, Ec2Client};
//!
//! let client = Ec2Client::connect(&AwsOptions::profile("snapshotalyzer")).await?;
//! let instances = client
//!     .list_instances(&InstanceFilter::new().project("demo"))
//!     .await?;
//! ```

mod convert;
pub mod ec2;

pub use ec2::{AwsOptions, Ec2Client};
