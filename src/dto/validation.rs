//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::state::{CONTROLLER_COUNT, teams::MAX_MEMBERS};

/// Validates team rosters: 1 to 4 teams of 1 to 4 non-blank names.
///
/// # Examples
///
/// ```ignore
/// validate_rosters(&[vec!["ann".into()]])          // Ok
/// validate_rosters(&[])                            // Err - no team
/// validate_rosters(&[vec!["a".into(), " ".into()]]) // Err - blank name
/// ```
pub fn validate_rosters(teams: &[Vec<String>]) -> Result<(), ValidationError> {
    if teams.is_empty() || teams.len() > CONTROLLER_COUNT {
        let mut err = ValidationError::new("team_count");
        err.message = Some(
            format!(
                "Between 1 and {CONTROLLER_COUNT} teams are required (got {})",
                teams.len()
            )
            .into(),
        );
        return Err(err);
    }

    if let Some(roster) = teams
        .iter()
        .find(|roster| roster.is_empty() || roster.len() > MAX_MEMBERS)
    {
        let mut err = ValidationError::new("roster_size");
        err.message = Some(
            format!(
                "Each team needs between 1 and {MAX_MEMBERS} members (got {})",
                roster.len()
            )
            .into(),
        );
        return Err(err);
    }

    if teams.iter().flatten().any(|name| name.trim().is_empty()) {
        let mut err = ValidationError::new("blank_name");
        err.message = Some("Member names cannot be blank".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_validate_rosters_valid() {
        assert!(validate_rosters(&[roster(&["ann"])]).is_ok());
        assert!(validate_rosters(&[roster(&["a", "b", "c", "d"]), roster(&["e"])]).is_ok());
    }

    #[test]
    fn test_validate_rosters_invalid_count() {
        assert!(validate_rosters(&[]).is_err());
        let five: Vec<_> = (0..5).map(|_| roster(&["x"])).collect();
        assert!(validate_rosters(&five).is_err());
    }

    #[test]
    fn test_validate_rosters_invalid_members() {
        assert!(validate_rosters(&[roster(&[])]).is_err());
        assert!(validate_rosters(&[roster(&["a", "b", "c", "d", "e"])]).is_err());
        assert!(validate_rosters(&[roster(&["a", "  "])]).is_err());
    }
}
