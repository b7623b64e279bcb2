use colored::Colorize;
use snapshotalyzer_cloud::{CloudError, SelectionError};
use snapshotalyzer_cloud_aws::{AwsOptions, Ec2Client};
use snapshotalyzer_config::Settings;

/// EC2 client built from the resolved settings
pub async fn init_client_with_error_handling(settings: &Settings) -> anyhow::Result<Ec2Client> {
    let options = AwsOptions {
        profile: settings.profile.clone(),
        region: settings.region.clone(),
    };

    match Ec2Client::connect(&options).await {
        Ok(client) => {
            tracing::debug!(region = ?client.region(), "EC2 client ready");
            Ok(client)
        }
        Err(e) => {
            eprintln!();
            eprintln!("{}", "✗ AWS connection error".red().bold());
            eprintln!();
            eprintln!("{}", "Cause:".yellow());
            eprintln!("  {}", e);
            eprintln!();
            eprintln!("{}", "How to fix:".yellow());
            eprintln!(
                "  • Check that profile '{}' exists in ~/.aws/config",
                options.profile.as_deref().unwrap_or("default")
            );
            eprintln!("  • Set a region with --region, AWS_REGION, or in the profile");
            Err(anyhow::anyhow!("could not connect to AWS"))
        }
    }
}

/// Follow-up advice for fatal selection errors
pub fn hint(error: &SelectionError) -> Option<&'static str> {
    match error {
        SelectionError::Precondition => None,
        SelectionError::Query(CloudError::ProfileNotFound(_)) => {
            Some("pass --profile or set SHOTTY_PROFILE to a profile from ~/.aws/config")
        }
        SelectionError::Query(CloudError::AuthenticationFailed(_)) => {
            Some("check the credentials of the selected profile (aws sts get-caller-identity)")
        }
        SelectionError::Query(CloudError::InvalidFilter(_)) => {
            Some("instance ids look like i-0123456789abcdef0")
        }
        SelectionError::Query(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hint() {
        assert!(hint(&SelectionError::Precondition).is_none());
        assert!(
            hint(&SelectionError::Query(CloudError::ProfileNotFound(
                "nope".into()
            )))
            .unwrap()
            .contains("--profile")
        );
        assert!(
            hint(&SelectionError::Query(CloudError::InvalidFilter(
                "bad".into()
            )))
            .is_some()
        );
        assert!(hint(&SelectionError::Query(CloudError::ApiError("x".into()))).is_none());
    }
}
