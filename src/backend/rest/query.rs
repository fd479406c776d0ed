//! PostgREST 查询串构造
//!
//! 只覆盖本应用用到的运算符：eq / in / is / or、排序和 limit。

use std::fmt::Display;

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    table: &'static str,
    columns: String,
    params: Vec<(String, String)>,
}

impl Select {
    pub fn from(table: &'static str) -> Self {
        Self {
            table,
            columns: "*".to_string(),
            params: Vec::new(),
        }
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    /// 列与嵌入资源，例如 `*,courses(name,code)`
    pub fn columns(mut self, columns: &str) -> Self {
        self.columns = columns.to_string();
        self
    }

    pub fn eq(self, column: &str, value: impl Display) -> Self {
        self.filter(column, format!("eq.{value}"))
    }

    pub fn is_null(self, column: &str) -> Self {
        self.filter(column, "is.null".to_string())
    }

    pub fn is_in<T: Display>(self, column: &str, values: &[T]) -> Self {
        let joined = values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.filter(column, format!("in.({joined})"))
    }

    /// `or=(a.is.null,a.eq.x)`
    pub fn or(mut self, conditions: &[String]) -> Self {
        self.params
            .push(("or".to_string(), format!("({})", conditions.join(","))));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.params
            .push(("order".to_string(), format!("{column}.{direction}")));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.params.push(("limit".to_string(), limit.to_string()));
        self
    }

    fn filter(mut self, column: &str, expression: String) -> Self {
        self.params.push((column.to_string(), expression));
        self
    }

    /// 查询参数（未编码，交给 HTTP 客户端编码）
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::with_capacity(self.params.len() + 1);
        query.push(("select".to_string(), self.columns.clone()));
        query.extend(self.params.iter().cloned());
        query
    }

    /// 更新/删除只需要过滤条件
    pub fn filters(&self) -> Vec<(String, String)> {
        self.params.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn q(key: &str, value: &str) -> (String, String) {
        (key.to_string(), value.to_string())
    }

    #[test]
    fn test_joined_select_with_filters() {
        let student = Uuid::nil();
        let select = Select::from("enrollments")
            .columns("*,courses(*)")
            .eq("student_id", student)
            .eq("is_active", true)
            .order("enrollment_date", false);

        assert_eq!(select.table(), "enrollments");
        assert_eq!(
            select.to_query(),
            vec![
                q("select", "*,courses(*)"),
                q("student_id", "eq.00000000-0000-0000-0000-000000000000"),
                q("is_active", "eq.true"),
                q("order", "enrollment_date.desc"),
            ]
        );
    }

    #[test]
    fn test_in_or_and_limit() {
        let select = Select::from("announcements")
            .or(&["target_role.is.null".to_string(), "target_role.eq.teacher".to_string()])
            .is_in("course_id", &[1, 2])
            .limit(5);

        let query = select.to_query();
        assert_eq!(query[0], q("select", "*"));
        assert!(query.contains(&q("or", "(target_role.is.null,target_role.eq.teacher)")));
        assert!(query.contains(&q("course_id", "in.(1,2)")));
        assert!(query.contains(&q("limit", "5")));
        assert_eq!(select.filters().len(), 3);
    }
}
