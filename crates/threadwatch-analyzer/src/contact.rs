use threadwatch_types::{Email, IssueType};

/// Who a director should talk to about an issue, as `(name, address)`.
///
/// Unresolved actions go to the first recipient, the person who was asked;
/// without recipients, and for risks, it is the author.
pub fn contact_for(issue_type: IssueType, email: &Email, participants: &[String]) -> (String, String) {
    match issue_type {
        IssueType::UnresolvedAction => match email.to_emails.first() {
            Some(address) => (name_for_address(address, participants), address.clone()),
            None => (email.from_name.clone(), email.from_email.clone()),
        },
        IssueType::EmergingRisk => (email.from_name.clone(), email.from_email.clone()),
    }
}

/// Display name for an address, from a `Name <address>` participant entry if
/// one exists, otherwise from the address's local part.
pub fn name_for_address(address: &str, participants: &[String]) -> String {
    participants
        .iter()
        .filter_map(|p| p.split_once('<'))
        .find(|(_, rest)| {
            rest.split('>')
                .next()
                .is_some_and(|bracketed| bracketed.trim().eq_ignore_ascii_case(address))
        })
        .map(|(name, _)| name.trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| name_from_local_part(address))
}

fn name_from_local_part(address: &str) -> String {
    let local = address.split('@').next().unwrap_or(address);
    titleize(&local.replace('.', " "))
}

// Upper-case the first letter of every alphabetic run, lower-case the rest.
fn titleize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}
