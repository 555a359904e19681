/// Decides which signed-in identities may manage images
pub trait AccessPolicy: Send + Sync {
    fn is_allowed(&self, email: &str) -> bool;
}

impl<F> AccessPolicy for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_allowed(&self, email: &str) -> bool {
        self(email)
    }
}

/// Allow-list of exact addresses, or whole domains written as `@example.org`
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    emails: Vec<String>,
    domains: Vec<String>,
}

impl AllowList {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::default();
        for entry in entries {
            let entry = entry.as_ref().trim().to_ascii_lowercase();
            if entry.is_empty() {
                continue;
            }
            match entry.strip_prefix('@') {
                Some(domain) if !domain.is_empty() => list.domains.push(domain.to_string()),
                Some(_) => {}
                None => list.emails.push(entry),
            }
        }
        list
    }
}

impl AccessPolicy for AllowList {
    fn is_allowed(&self, email: &str) -> bool {
        let email = email.trim().to_ascii_lowercase();
        if email.is_empty() {
            return false;
        }
        if self.emails.iter().any(|allowed| *allowed == email) {
            return true;
        }
        match email.rsplit_once('@') {
            Some((local, domain)) if !local.is_empty() => {
                self.domains.iter().any(|allowed| allowed == domain)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_ignores_case_and_whitespace() {
        let policy = AllowList::new(["  Owner@Example.org "]);
        assert!(policy.is_allowed("owner@example.org"));
        assert!(policy.is_allowed("OWNER@example.ORG"));
        assert!(!policy.is_allowed("other@example.org"));
    }

    #[test]
    fn test_domain_entries() {
        let policy = AllowList::new(["@studio.test", "@"]);
        assert!(policy.is_allowed("anyone@studio.test"));
        assert!(!policy.is_allowed("@studio.test"));
        assert!(!policy.is_allowed("anyone@evil-studio.test"));
    }

    #[test]
    fn test_empty_list_denies_everyone() {
        let policy = AllowList::new(Vec::<String>::new());
        assert!(!policy.is_allowed("owner@example.org"));
        assert!(!policy.is_allowed(""));
    }

    #[test]
    fn test_closure_policy() {
        let policy = |email: &str| email.ends_with("@ok.test");
        assert!(policy.is_allowed("a@ok.test"));
        assert!(!AccessPolicy::is_allowed(&policy, "a@no.test"));
    }
}
