//! Prompt templates for each pipeline stage.

/// Prompt for the first reasoning pass over the query.
pub fn initial_reasoning(query: &str) -> String {
    format!(
        "You are an expert in reasoning and problem-solving. Analyze the following query and break it down into smaller, manageable parts. For coding tasks, consider the problem requirements, necessary functions, and overall structure. For general tasks, identify the key components and logical steps needed to address the query.

User Query:
{query}

Provide your initial reasoning in the following format:
<reasoning>
Step 1: Query Breakdown
[Break down the query into smaller parts or steps]

Step 2: Key Components
[Identify the key concepts, functions, or elements required]

Step 3: Approach Outline
[Outline a high-level approach or plan to solve the query]
</reasoning>
"
    )
}

/// Prompt for one chain-of-thought refinement.
///
/// `previous` is every earlier output of the same model joined by newlines.
pub fn chain_of_thought(previous: &str, query: &str, iteration: usize) -> String {
    format!(
        "You are refining your reasoning through a chain-of-thought process. Based on all previous iterations, improve your approach by considering alternative methods, potential edge cases, and enhancements in logic or efficiency.

Previous Iterations:
{previous}

User Query:
{query}

Provide the following for this iteration:
<chain-of-thought>
Iteration {iteration}:
- Refinement: [Describe how you're improving the approach]
- Considerations: [Note any edge cases, optimizations, or alternative solutions]
- Updated Plan: [Provide the updated plan or pseudocode]
</chain-of-thought>
"
    )
}

/// Prompt for the final answer.
///
/// `history` holds every reasoning chain: entries of one chain joined by a
/// newline, chains separated by a blank line.
pub fn final_response(history: &str, query: &str) -> String {
    format!(
        "You are tasked with generating a final response based on the following reasoning history.

Reasoning History:
{history}

User Query:
{query}

Follow these steps:
1. Review the reasoning history and extract the key insights or solutions.
2. For coding tasks, generate the final code based on the most refined plan.
3. For general tasks, formulate a concise and logical answer.
4. Ensure the response is complete, accurate, and directly addresses the query.

Provide only the final response or code.
"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_reasoning_embeds_query() {
        let prompt = initial_reasoning("sort a list");
        assert!(prompt.contains("User Query:\nsort a list\n"));
        assert!(prompt.ends_with("</reasoning>\n"));
    }

    #[test]
    fn test_chain_of_thought_embeds_history() {
        let prompt = chain_of_thought("first\nsecond {braces}", "q", 2);
        assert!(prompt.contains("Previous Iterations:\nfirst\nsecond {braces}\n\nUser Query:\nq\n"));
        assert!(prompt.contains("Iteration 2:\n"));
    }

    #[test]
    fn test_final_response_embeds_history() {
        let prompt = final_response("a\nb\n\nc", "q");
        assert!(prompt.contains("Reasoning History:\na\nb\n\nc\n\nUser Query:\nq\n"));
        assert!(prompt.ends_with("Provide only the final response or code.\n"));
    }
}
