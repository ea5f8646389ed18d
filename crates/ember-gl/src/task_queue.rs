use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

type Task = Box<dyn FnOnce()>;

/// Single-threaded FIFO of deferred work, one task per scheduling turn.
///
/// Cloning yields another handle to the same queue. Tasks run with the queue
/// unborrowed, so a task may post more tasks.
#[derive(Clone, Default)]
pub struct TaskQueue {
    tasks: Rc<RefCell<VecDeque<Task>>>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&self, task: impl FnOnce() + 'static) {
        self.tasks.borrow_mut().push_back(Box::new(task));
    }

    /// Runs the oldest task. Returns `false` when the queue was empty.
    pub fn run_one(&self) -> bool {
        let task = self.tasks.borrow_mut().pop_front();
        match task {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Runs tasks until the queue is empty, including ones posted along the way.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while self.run_one() {
            ran += 1;
        }
        ran
    }

    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.borrow().is_empty()
    }
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue")
            .field("pending", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn runs_in_post_order_including_reposts() {
        let queue = TaskQueue::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let o = Rc::clone(&order);
        let q = queue.clone();
        queue.post(move || {
            o.borrow_mut().push(1);
            let o2 = Rc::clone(&o);
            q.post(move || o2.borrow_mut().push(3));
        });
        let o = Rc::clone(&order);
        queue.post(move || o.borrow_mut().push(2));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.run_pending(), 3);
        assert_eq!(*order.borrow(), vec![1, 2, 3]);
        assert!(queue.is_empty());
    }

    #[test]
    fn run_one_steps_a_single_turn() {
        let queue = TaskQueue::new();
        let hits = Rc::new(Cell::new(0));
        for _ in 0..2 {
            let hits = Rc::clone(&hits);
            queue.post(move || hits.set(hits.get() + 1));
        }
        assert!(queue.run_one());
        assert_eq!(hits.get(), 1);
        assert!(queue.run_one());
        assert!(!queue.run_one());
        assert_eq!(hits.get(), 2);
    }
}
