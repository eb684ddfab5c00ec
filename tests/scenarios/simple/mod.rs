mod t1_build;
mod t2_prereq;
mod t3_up_to_date;
mod t4_rebuild;
