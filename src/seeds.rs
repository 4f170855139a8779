//! Built-in content: the default question seeded into an empty cache and a
//! small starter pool for running without a remote store.

use serde_json::{json, Value};

use crate::domain::Question;
use crate::store::{Document, Fields};

/// Last-resort question so the app is never empty.
pub fn default_question() -> Question {
  Question {
    id: "1".into(),
    title: "Palindrome Checker".into(),
    description: "Implement a function to determine if a given string reads the same forwards and backwards.".into(),
    difficulty: "Easy".into(),
    topic: "Strings".into(),
    time_estimate: "15 mins".into(),
    starter_code: "fun isPalindrome(s: String): Boolean {\n    // Your code here\n}".into(),
    solution_code: "fun isPalindrome(s: String): Boolean {\n    return s == s.reversed()\n}".into(),
    is_solved: false,
    is_bookmarked: false,
    user_code: None,
    date: 0,
  }
}

fn doc(id: &str, fields: Value) -> Document {
  let fields: Fields = match fields {
    Value::Object(map) => map,
    _ => Fields::new(),
  };
  Document { id: id.into(), fields }
}

/// Starter pool for the in-memory store.
pub fn starter_pool() -> Vec<Document> {
  vec![
    doc("seed-001", json!({
      "title": "Two Sum",
      "description": "Given an array of integers and a target, return the indices of the two numbers that add up to the target.",
      "difficulty": "Easy",
      "topic": "Arrays",
      "timeEstimate": "15 mins",
      "starterCode": "fn two_sum(nums: &[i32], target: i32) -> (usize, usize) {\n    // Your code here\n}",
      "solutionCode": "fn two_sum(nums: &[i32], target: i32) -> (usize, usize) {\n    let mut seen = std::collections::HashMap::new();\n    for (i, n) in nums.iter().enumerate() {\n        if let Some(&j) = seen.get(&(target - n)) {\n            return (j, i);\n        }\n        seen.insert(*n, i);\n    }\n    (0, 0)\n}"
    })),
    doc("seed-002", json!({
      "title": "Valid Parentheses",
      "description": "Given a string of brackets, decide whether every opening bracket is closed in the correct order.",
      "difficulty": "Easy",
      "topic": "Stacks",
      "timeEstimate": "20 mins",
      "starterCode": "fn is_valid(s: &str) -> bool {\n    // Your code here\n}",
      "solutionCode": "fn is_valid(s: &str) -> bool {\n    let mut stack = Vec::new();\n    for c in s.chars() {\n        match c {\n            '(' => stack.push(')'),\n            '[' => stack.push(']'),\n            '{' => stack.push('}'),\n            _ => if stack.pop() != Some(c) { return false; },\n        }\n    }\n    stack.is_empty()\n}"
    })),
    doc("seed-003", json!({
      "title": "Merge Intervals",
      "description": "Merge all overlapping intervals and return the non-overlapping result sorted by start.",
      "difficulty": "Medium",
      "topic": "Sorting",
      "timeEstimate": "30 mins",
      "starterCode": "fn merge(intervals: Vec<(i32, i32)>) -> Vec<(i32, i32)> {\n    // Your code here\n}",
      "solutionCode": "fn merge(mut intervals: Vec<(i32, i32)>) -> Vec<(i32, i32)> {\n    intervals.sort();\n    let mut out: Vec<(i32, i32)> = Vec::new();\n    for (s, e) in intervals {\n        match out.last_mut() {\n            Some(last) if s <= last.1 => last.1 = last.1.max(e),\n            _ => out.push((s, e)),\n        }\n    }\n    out\n}"
    })),
  ]
}
