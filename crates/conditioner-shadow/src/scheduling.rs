use conditioner_types::AccountStatus;

/// §4.11: `check_interval_hours` starts at 4, reduced to 1 for the first
/// three posts of a `New`/`WarmingUp` account. `post_ordinal` is 1-indexed
/// (the 1st, 2nd, 3rd post registered under that account).
#[must_use]
pub fn initial_check_interval_hours(account_status: AccountStatus, post_ordinal: u32) -> u32 {
    let is_warming_up = matches!(account_status, AccountStatus::New | AccountStatus::WarmingUp);
    if is_warming_up && (1..=3).contains(&post_ordinal) {
        1
    } else {
        4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_accounts_get_tight_interval_for_first_three_posts() {
        assert_eq!(initial_check_interval_hours(AccountStatus::New, 1), 1);
        assert_eq!(initial_check_interval_hours(AccountStatus::New, 3), 1);
        assert_eq!(initial_check_interval_hours(AccountStatus::New, 4), 4);
    }

    #[test]
    fn established_accounts_always_use_the_default_interval() {
        assert_eq!(initial_check_interval_hours(AccountStatus::Established, 1), 4);
    }
}
