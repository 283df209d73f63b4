#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use taskvault::libs::controller::{ControllerError, Deletion, SaveStatus, TaskListController, ViewFilter};
    use taskvault::libs::task::{TaskRecord, Timestamp, DEFAULT_HEADER_TEXT, DEFAULT_ITEM_TEXT};
    use test_context::{test_context, TestContext};

    fn at(minute: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2025, 6, 2, 8, minute, 0).unwrap()
    }

    /// Header "Work" with two items (the second done), then header "Home" with none.
    struct ControllerTestContext {
        controller: TaskListController,
    }

    impl TestContext for ControllerTestContext {
        fn setup() -> Self {
            let mut done = TaskRecord::item("Send mail");
            done.done = true;
            done.completed_at = Some(at(0));
            let tasks = vec![TaskRecord::header("Work"), TaskRecord::item("Write report"), done, TaskRecord::header("Home")];
            ControllerTestContext {
                controller: TaskListController::with_tasks(tasks),
            }
        }
    }

    impl ControllerTestContext {
        fn texts(&self) -> Vec<&str> {
            self.controller.tasks().iter().map(|task| task.text.as_str()).collect()
        }
    }

    #[test]
    fn test_new_controller_is_clean() {
        let controller = TaskListController::new();
        assert!(controller.is_empty());
        assert!(!controller.has_unsaved_changes());
        assert!(!controller.is_saving());
        assert_eq!(controller.save_status(), &SaveStatus::Idle);
        assert_eq!(controller.filter(), ViewFilter::All);
    }

    #[test_context(ControllerTestContext)]
    #[test]
    fn test_add_uses_default_texts_and_marks_dirty(ctx: &mut ControllerTestContext) {
        let header = ctx.controller.add_header();
        let item = ctx.controller.add_item();

        assert_eq!(ctx.controller.tasks()[header].text, DEFAULT_HEADER_TEXT);
        assert_eq!(ctx.controller.tasks()[item].text, DEFAULT_ITEM_TEXT);
        assert!(ctx.controller.has_unsaved_changes());
        assert_eq!(ctx.controller.save_status(), &SaveStatus::Pending);
    }

    #[test_context(ControllerTestContext)]
    #[test]
    fn test_add_item_after(ctx: &mut ControllerTestContext) {
        let index = ctx.controller.add_item_after_with_text(0, "First thing").unwrap();
        assert_eq!(index, 1);
        assert_eq!(ctx.texts(), vec!["Work", "First thing", "Write report", "Send mail", "Home"]);

        let err = ctx.controller.add_item_after(10).unwrap_err();
        assert_eq!(err, ControllerError::IndexOutOfRange { index: 10, len: 5 });
    }

    #[test_context(ControllerTestContext)]
    #[test]
    fn test_delete_header_with_items_asks_first(ctx: &mut ControllerTestContext) {
        assert!(ctx.controller.header_has_items(0));
        assert_eq!(ctx.controller.header_item_count(0), 2);

        let mut asked = None;
        let result = ctx
            .controller
            .delete_task(0, |task, items| {
                asked = Some((task.text.clone(), items));
                false
            })
            .unwrap();
        assert_eq!(result, Deletion::Cancelled);
        assert_eq!(asked, Some(("Work".to_string(), 2)));
        assert_eq!(ctx.controller.len(), 4);
        assert!(!ctx.controller.has_unsaved_changes());

        let result = ctx.controller.delete_task(0, |_, _| true).unwrap();
        assert!(matches!(result, Deletion::Deleted(task) if task.text == "Work"));
        assert_eq!(ctx.texts(), vec!["Write report", "Send mail", "Home"]);
        assert!(ctx.controller.has_unsaved_changes());
    }

    #[test_context(ControllerTestContext)]
    #[test]
    fn test_delete_empty_header_and_items_without_asking(ctx: &mut ControllerTestContext) {
        assert!(!ctx.controller.header_has_items(3));
        let never = |_: &TaskRecord, _: usize| -> bool { panic!("confirmation not expected") };

        ctx.controller.delete_task(3, never).unwrap();
        ctx.controller.delete_task(1, never).unwrap();
        assert_eq!(ctx.texts(), vec!["Work", "Send mail"]);
    }

    #[test_context(ControllerTestContext)]
    #[test]
    fn test_toggle_stamps_and_clears(ctx: &mut ControllerTestContext) {
        assert!(ctx.controller.toggle_task(1, at(5)).unwrap());
        assert_eq!(ctx.controller.tasks()[1].completed_at, Some(at(5)));

        assert!(!ctx.controller.toggle_task(1, at(6)).unwrap());
        assert_eq!(ctx.controller.tasks()[1].completed_at, None);
        assert!(ctx.controller.has_unsaved_changes());
    }

    #[test_context(ControllerTestContext)]
    #[test]
    fn test_toggle_header_is_rejected(ctx: &mut ControllerTestContext) {
        assert_eq!(ctx.controller.toggle_task(0, at(1)), Err(ControllerError::NotAnItem(0)));
        assert!(!ctx.controller.has_unsaved_changes());
    }

    #[test_context(ControllerTestContext)]
    #[test]
    fn test_update_text_only_dirties_on_change(ctx: &mut ControllerTestContext) {
        ctx.controller.update_task_text(1, "Write report").unwrap();
        assert!(!ctx.controller.has_unsaved_changes());

        ctx.controller.update_task_text(1, "Write the report").unwrap();
        assert_eq!(ctx.controller.tasks()[1].text, "Write the report");
        assert!(ctx.controller.has_unsaved_changes());
    }

    #[test_context(ControllerTestContext)]
    #[test]
    fn test_move_task(ctx: &mut ControllerTestContext) {
        let before = ctx.controller.tasks()[3].clone();
        ctx.controller.move_task(3, 0).unwrap();
        assert_eq!(ctx.texts(), vec!["Home", "Work", "Write report", "Send mail"]);
        assert_eq!(ctx.controller.tasks()[0], before);

        ctx.controller.move_task(0, 99).unwrap();
        assert_eq!(ctx.texts(), vec!["Work", "Write report", "Send mail", "Home"]);
    }

    #[test_context(ControllerTestContext)]
    #[test]
    fn test_move_to_same_position_is_noop(ctx: &mut ControllerTestContext) {
        ctx.controller.move_task(2, 2).unwrap();
        assert!(!ctx.controller.has_unsaved_changes());
        assert!(ctx.controller.move_task(7, 0).is_err());
    }

    #[test_context(ControllerTestContext)]
    #[test]
    fn test_filtered_view_keeps_headers(ctx: &mut ControllerTestContext) {
        assert_eq!(ctx.controller.filtered_view().len(), 4);

        assert_eq!(ctx.controller.toggle_filter(), ViewFilter::HideCompleted);
        let view = ctx.controller.filtered_view();
        let indices: Vec<usize> = view.iter().map(|entry| entry.index).collect();
        assert_eq!(indices, vec![0, 1, 3]);
        assert!(!ctx.controller.has_unsaved_changes());

        // Saves still carry the hidden record
        ctx.controller.add_item();
        let payload = ctx.controller.begin_save().unwrap();
        assert_eq!(payload.len(), 5);
        assert!(payload[2].done);
    }

    #[test_context(ControllerTestContext)]
    #[test]
    fn test_save_protocol(ctx: &mut ControllerTestContext) {
        assert!(ctx.controller.begin_save().is_none());

        ctx.controller.add_item();
        let payload = ctx.controller.begin_save().unwrap();
        assert_eq!(payload.len(), 5);
        assert!(ctx.controller.is_saving());
        assert_eq!(ctx.controller.save_status(), &SaveStatus::Saving);
        assert!(ctx.controller.begin_save().is_none());

        assert!(!ctx.controller.finish_save(Ok(at(10))));
        assert!(!ctx.controller.is_saving());
        assert!(!ctx.controller.has_unsaved_changes());
        assert_eq!(ctx.controller.last_saved(), Some(at(10)));
        assert_eq!(ctx.controller.save_status(), &SaveStatus::Saved(at(10)));
    }

    #[test_context(ControllerTestContext)]
    #[test]
    fn test_mutation_during_save_needs_follow_up(ctx: &mut ControllerTestContext) {
        ctx.controller.add_item();
        ctx.controller.begin_save().unwrap();
        ctx.controller.update_task_text(0, "Office").unwrap();
        assert_eq!(ctx.controller.save_status(), &SaveStatus::Saving);

        assert!(ctx.controller.finish_save(Ok(at(11))));
        assert!(ctx.controller.has_unsaved_changes());
        assert_eq!(ctx.controller.save_status(), &SaveStatus::Pending);

        let follow_up = ctx.controller.begin_save().unwrap();
        assert_eq!(follow_up[0].text, "Office");
    }

    #[test_context(ControllerTestContext)]
    #[test]
    fn test_failed_save_keeps_changes(ctx: &mut ControllerTestContext) {
        ctx.controller.add_item();
        ctx.controller.begin_save().unwrap();

        assert!(!ctx.controller.finish_save(Err("connection refused".to_string())));
        assert!(ctx.controller.has_unsaved_changes());
        assert_eq!(ctx.controller.save_status(), &SaveStatus::Error("connection refused".to_string()));
        assert_eq!(ctx.controller.begin_save().map(|tasks| tasks.len()), Some(5));
    }

    #[test_context(ControllerTestContext)]
    #[test]
    fn test_replace_all_and_clear(ctx: &mut ControllerTestContext) {
        ctx.controller.add_item();
        ctx.controller.replace_all(vec![TaskRecord::item("Only")], Some(at(20)));
        assert_eq!(ctx.texts(), vec!["Only"]);
        assert!(!ctx.controller.has_unsaved_changes());
        assert_eq!(ctx.controller.last_saved(), Some(at(20)));

        ctx.controller.set_filter(ViewFilter::HideCompleted);
        ctx.controller.clear();
        assert!(ctx.controller.is_empty());
        assert_eq!(ctx.controller.filter(), ViewFilter::All);
        assert!(ctx.controller.last_saved().is_none());
    }
}
