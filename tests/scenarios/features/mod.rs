mod t1_dry_run;
mod t2_suffix_rule;
mod t3_double_colon;
mod t4_keep_going;
mod t5_question;
mod t6_touch;
