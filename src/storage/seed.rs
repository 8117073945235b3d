use chrono::{DateTime, Duration, Utc};

use crate::models::achievement::Achievement;
use crate::models::task::{Difficulty, Recurrence, Task, TaskStatus, WeekdayTag};
use crate::models::user::User;

pub fn default_user() -> User {
    User::default()
}

/// Starter habits, anchored on `now`.
pub fn default_tasks(now: DateTime<Utc>) -> Vec<Task> {
    let task = |id: &str, title: &str, category: &str, difficulty: Difficulty| Task {
        id: id.to_string(),
        title: title.to_string(),
        category: category.to_string(),
        icon: Some(category.to_string()),
        difficulty,
        completed: false,
        status: TaskStatus::Active,
        due_date: now,
        recurrence: None,
        time: None,
    };

    use WeekdayTag::*;
    vec![
        Task {
            recurrence: Some(Recurrence::on_days(vec![Mon, Tue, Wed, Thu, Fri])),
            time: Some("20:00".into()),
            ..task("read", "Read for 20 minutes", "Learning", Difficulty::Easy)
        },
        Task {
            recurrence: Some(Recurrence::on_days(vec![Tue, Thu])),
            time: Some("16:30".into()),
            ..task("drawing", "Practice drawing", "Creative", Difficulty::Medium)
        },
        Task {
            time: Some("21:00".into()),
            ..task("bedtime", "Go to bed on time", "Health", Difficulty::Easy)
        },
        Task {
            due_date: now - Duration::days(1),
            ..task("homework", "Finish science homework", "School", Difficulty::Hard)
        },
        Task {
            status: TaskStatus::Paused,
            due_date: now + Duration::days(1),
            ..task("bike", "Bike ride in the park", "Activity", Difficulty::Medium)
        },
        Task {
            time: Some("07:00".into()),
            ..task("workout", "Morning workout", "Health", Difficulty::Medium)
        },
    ]
}

pub fn default_achievements(now: DateTime<Utc>) -> Vec<Achievement> {
    let badge = |id: &str, title: &str, description: &str, icon: &str| Achievement {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
        image_url: None,
        unlocked: false,
        date_unlocked: None,
        tasks_required: None,
        days_required: None,
    };
    let unlocked = |mut achievement: Achievement, days_ago: i64| {
        achievement.unlocked = true;
        achievement.date_unlocked = Some(now - Duration::days(days_ago));
        achievement
    };

    vec![
        unlocked(
            Achievement {
                tasks_required: Some(1),
                ..badge("1", "First Mission", "Complete your very first task.", "Star")
            },
            5,
        ),
        unlocked(
            Achievement {
                tasks_required: Some(10),
                ..badge("2", "Task Master", "Complete 10 tasks in total.", "Trophy")
            },
            2,
        ),
        Achievement {
            days_required: Some(7),
            ..badge(
                "3",
                "Perfect Week",
                "Complete all your tasks for 7 days in a row.",
                "ShieldCheck",
            )
        },
        unlocked(
            Achievement {
                days_required: Some(3),
                ..badge("4", "Streak Starter", "Maintain a 3-day completion streak.", "Zap")
            },
            3,
        ),
        badge("5", "Learning Hero", "Complete 5 learning tasks.", "Book"),
        badge("6", "Creative Genius", "Complete 5 creative tasks.", "Brush"),
        unlocked(streak("ant_bronze", "Little Ant - Bronze", "1-day streak.", "Bug", 1), 0),
        unlocked(streak("ant_silver", "Little Ant - Silver", "3-day streak.", "Bug", 3), 0),
        streak("ant_gold", "Little Ant - Gold", "7-day streak.", "Bug", 7),
        streak("knight_bronze", "Brave Knight - Bronze", "7-day streak.", "Swords", 7),
        streak("knight_silver", "Brave Knight - Silver", "14-day streak.", "Swords", 14),
        streak("knight_gold", "Brave Knight - Gold", "21-day streak.", "Swords", 21),
        streak("explorer_bronze", "Magic Explorer - Bronze", "30-day streak.", "Mountain", 30),
        streak("explorer_silver", "Magic Explorer - Silver", "60-day streak.", "Mountain", 60),
        streak("explorer_gold", "Magic Explorer - Gold", "90-day streak.", "Mountain", 90),
        streak("guardian_bronze", "Seasons Guardian - Bronze", "90-day streak.", "Flower", 90),
        streak("guardian_silver", "Seasons Guardian - Silver", "180-day streak.", "Flower", 180),
        streak("guardian_gold", "Seasons Guardian - Gold", "365-day streak.", "Flower", 365),
        streak("master_bronze", "Super Master - Bronze", "1-year streak.", "Gem", 365),
        streak("master_silver", "Super Master - Silver", "2-year streak.", "Gem", 730),
        streak("master_gold", "Super Master - Gold", "3-year streak.", "Gem", 1095),
    ]
}

fn streak(id: &str, title: &str, description: &str, icon: &str, days: u32) -> Achievement {
    Achievement {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
        image_url: None,
        unlocked: false,
        date_unlocked: None,
        tasks_required: None,
        days_required: Some(days),
    }
}
