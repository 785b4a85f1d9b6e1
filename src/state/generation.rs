/// Request generations for one kind of fetch.
///
/// Every request is stamped with a fresh, increasing generation. A user
/// change (new category, date or view) supersedes everything issued before
/// it; a polling refresh does not, so an in-flight user request is still
/// honoured when a poll overtakes it. A response is applied only when it is
/// newer than what is on screen and not older than the latest superseding
/// request.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RequestTracker {
    issued: u64,
    superseded_before: u64,
    applied: u64,
}

impl RequestTracker {
    /// Generation for a user-initiated fetch.
    pub fn begin_change(&mut self) -> u64 {
        self.issued += 1;
        self.superseded_before = self.issued;
        self.issued
    }

    /// Generation for a periodic refresh.
    pub fn begin_poll(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// Record the response as applied if it is still current.
    pub fn accept(&mut self, generation: u64) -> bool {
        if generation <= self.applied || generation < self.superseded_before {
            return false;
        }
        self.applied = generation;
        true
    }

    pub fn latest(&self) -> u64 {
        self.issued
    }
}
