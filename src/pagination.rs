/// One page of the queue listing.
///
/// `entries` carry their 1-based position in the whole queue, so page 2 of a
/// 10-per-page listing starts at 11.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueuePage {
    pub index: usize,
    pub page_count: usize,
    pub total: usize,
    pub entries: Vec<(usize, String)>,
}

impl QueuePage {
    /// Cuts page `requested` (0-based) out of `titles`. Requests past the last page clamp to
    /// it; a zero page size is treated as one.
    pub fn build(titles: &[String], page_size: usize, requested: usize) -> QueuePage {
        let page_size = page_size.max(1);
        let total = titles.len();
        let page_count = (total + page_size - 1) / page_size;
        let index = requested.min(page_count.saturating_sub(1));

        let entries = titles
            .iter()
            .enumerate()
            .skip(index * page_size)
            .take(page_size)
            .map(|(position, title)| (position + 1, title.clone()))
            .collect();

        QueuePage {
            index,
            page_count,
            total,
            entries,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|(position, title)| format!("{position}. {title}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn footer(&self) -> String {
        format!(
            "Page {}/{} · {} tracks",
            self.index + 1,
            self.page_count.max(1),
            self.total
        )
    }
}
