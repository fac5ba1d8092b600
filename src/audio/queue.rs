use std::collections::VecDeque;
use thiserror::Error;
use tracing::{debug, info};

use super::track::QueueItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("La cola está llena (máximo {max} canciones)")]
pub struct QueueFull {
    pub max: usize,
}

/// Cola FIFO de pistas pendientes de una guild
#[derive(Debug)]
pub struct TrackQueue {
    items: VecDeque<QueueItem>,
    max_size: usize,
}

impl TrackQueue {
    pub fn new(max_size: usize) -> Self {
        Self {
            items: VecDeque::new(),
            max_size,
        }
    }

    /// Agrega un track al final de la cola
    pub fn enqueue(&mut self, item: QueueItem) -> Result<(), QueueFull> {
        if self.items.len() >= self.max_size {
            return Err(QueueFull { max: self.max_size });
        }

        debug!("➕ Agregado a la cola: {}", item.descriptor.label());
        self.items.push_back(item);
        Ok(())
    }

    /// Obtiene el siguiente track (FIFO - First In, First Out)
    pub fn dequeue_front(&mut self) -> Option<QueueItem> {
        let next = self.items.pop_front();
        match &next {
            Some(item) => debug!("➡️ Siguiente en cola: {}", item.descriptor.label()),
            None => debug!("📭 Cola vacía, no hay siguiente track"),
        }
        next
    }

    /// Inserta al frente, ignorando el límite: la repetición nunca debe fallar
    pub fn insert_front(&mut self, item: QueueItem) {
        self.items.push_front(item);
    }

    pub fn peek_is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Limpia la cola y devuelve cuántas pistas se quitaron
    pub fn clear(&mut self) -> usize {
        let removed = self.items.len();
        self.items.clear();
        if removed > 0 {
            info!("🗑️ Cola limpiada ({} canciones)", removed);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueueItem> {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::track::{CatalogTrack, TrackDescriptor};
    use pretty_assertions::assert_eq;
    use serenity::model::id::UserId;

    fn query(raw: &str) -> QueueItem {
        QueueItem::new(TrackDescriptor::Query(raw.to_string()), UserId::new(1))
    }

    fn catalog(title: &str, artist: &str) -> QueueItem {
        let track = CatalogTrack::new(title, artist)
            .with_source_url(Some(format!("https://open.spotify.com/track/{}", title)))
            .with_thumbnail(None);
        QueueItem::new(TrackDescriptor::Catalog(track), UserId::new(2))
    }

    #[test]
    fn preserves_order_and_shape() {
        let mut queue = TrackQueue::new(10);
        let input = vec![
            query("A - Song1"),
            catalog("Song2", "B"),
            query("https://youtu.be/xyz"),
            catalog("Song4", ""),
        ];

        for item in input.clone() {
            queue.enqueue(item).unwrap();
        }

        let mut output = Vec::new();
        while let Some(item) = queue.dequeue_front() {
            output.push(item);
        }

        assert_eq!(output, input);
        assert!(queue.peek_is_empty());
    }

    #[test]
    fn dequeue_on_empty_is_none() {
        let mut queue = TrackQueue::new(3);
        assert_eq!(queue.dequeue_front(), None);
        assert_eq!(queue.dequeue_front(), None);
    }

    #[test]
    fn insert_front_jumps_the_line() {
        let mut queue = TrackQueue::new(3);
        queue.enqueue(query("second")).unwrap();
        queue.insert_front(query("first"));

        assert_eq!(queue.dequeue_front(), Some(query("first")));
        assert_eq!(queue.dequeue_front(), Some(query("second")));
    }

    #[test]
    fn rejects_when_full() {
        let mut queue = TrackQueue::new(2);
        queue.enqueue(query("a")).unwrap();
        queue.enqueue(query("b")).unwrap();

        assert_eq!(queue.enqueue(query("c")), Err(QueueFull { max: 2 }));
        assert_eq!(queue.len(), 2);

        // Replay sigue funcionando con la cola llena
        queue.insert_front(query("replay"));
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn clear_reports_removed_count() {
        let mut queue = TrackQueue::new(5);
        queue.enqueue(query("a")).unwrap();
        queue.enqueue(query("b")).unwrap();

        assert_eq!(queue.clear(), 2);
        assert_eq!(queue.clear(), 0);
        assert!(queue.peek_is_empty());
    }
}
